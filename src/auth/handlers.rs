//! Auth HTTP handlers: register, login, logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::models::User;
use crate::services::{Credentials, Registration};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v)
        .map_err(|_| AppError::Validation("Invalid request payload".to_string()))
}

pub(crate) fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let registration = payload(body)?;
    let user = state.sessions().register(&registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user,
        }),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials = payload(body)?;
    let token = state.sessions().login(&credentials).await?;
    Ok(Json(LoginResponse { token }))
}

/// POST /logout — revokes the bearer token in the `Authorization` header.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    state.sessions().logout(authorization(&headers)).await?;
    Ok(Json(json!({ "message": "Successfully logged out" })))
}
