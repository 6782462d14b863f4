//! Admission for protected routes: bearer token verification, then the
//! revocation gate.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::debug;

use crate::auth::{authorization, Claims};
use crate::error::AppError;
use crate::handlers::http::AppState;

/// Extractor: claims of the admitted token. Only available behind [`require_auth`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::InvalidToken)
    }
}

/// Middleware: reject requests whose bearer token is missing, invalid,
/// expired or revoked; otherwise attach the verified claims.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = authorization(request.headers()).map(str::to_owned);
    let claims = match state
        .sessions()
        .authenticate(header.as_deref(), Utc::now())
        .await
    {
        Ok(claims) => claims,
        Err(e) => {
            debug!(path = %request.uri().path(), error = %e, "admission rejected");
            return Err(e);
        }
    };

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
