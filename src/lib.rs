//! Credential and session service built with Rust.
//!
//! Registers users, authenticates them with argon2-hashed passwords, issues
//! HS256 bearer tokens and enforces logout through a revocation deny-list
//! checked on every protected route.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::{AuthConfig, Config};
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::SessionService;

use axum::routing::{get, post};
use handlers::http;
use tower_http::trace::TraceLayer;

/// Build the API router (auth, profile, health). Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let protected_routes = axum::Router::new()
        .route("/profile", get(http::profile))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/health", get(http::health))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
