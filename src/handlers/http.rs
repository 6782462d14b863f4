//! HTTP handlers: profile and health.

use axum::{http::StatusCode, Json};
use serde_json::json;

use crate::middleware::AuthUser;
use crate::services::SessionService;

/// Shared application state for HTTP handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(sessions: SessionService) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &SessionService {
        &self.sessions
    }
}

/// GET /profile — greets the owner of an admitted token.
pub async fn profile(AuthUser(claims): AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "message": format!("Welcome {}", claims.email) }))
}

/// GET /health: liveness check.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "sessiond" })),
    )
}
