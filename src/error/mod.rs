//! Application error types for robust error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::TokenError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level errors.
///
/// Credential and token failures carry no detail so the response never tells a
/// caller which check rejected it.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username or email already exists")]
    DuplicateCredential,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateCredential => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken | AppError::TokenRevoked => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Config(_)
            | AppError::Db(_)
            | AppError::Storage(_)
            | AppError::Hashing(_)
            | AppError::Signing(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Signing(msg) => AppError::Signing(msg),
            _ => AppError::InvalidToken,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "request failed");
                INTERNAL_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn maps_taxonomy_to_status_codes() {
        let (status, _) = body_of(AppError::Validation("bad".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = body_of(AppError::DuplicateCredential).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username or email already exists");
        let (status, body) = body_of(AppError::TokenRevoked).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token has been revoked");
    }

    #[tokio::test]
    async fn internal_details_are_not_exposed() {
        let err = AppError::Storage("connection refused to 10.0.0.3".into());
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_MESSAGE);

        let (_, body) = body_of(AppError::Hashing("salt".into())).await;
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }

    #[test]
    fn token_errors_collapse_to_invalid_token() {
        assert!(matches!(
            AppError::from(TokenError::Expired),
            AppError::InvalidToken
        ));
        assert!(matches!(
            AppError::from(TokenError::InvalidSignature),
            AppError::InvalidToken
        ));
        assert!(matches!(
            AppError::from(TokenError::Signing("empty key".into())),
            AppError::Signing(_)
        ));
    }
}
