//! Session lifecycle: register, login, logout and the revocation gate for
//! protected routes.
//!
//! Tokens are stateless. A token is valid when its signature checks out, it is
//! unexpired and it is absent from the revocation store. Revocation is
//! terminal.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::auth::{strip_bearer, token_fingerprint, Claims, CredentialHasher, TokenCodec};
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, User};
use crate::repositories::{RevocationStore, UserStore};

#[derive(Deserialize, Validate)]
pub struct Registration {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "password is required"))]
    pub password: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Composes hashing, token signing and the stores. Stores are injected so each
/// instance (and each test) owns its own backend.
#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
    hasher: CredentialHasher,
    tokens: TokenCodec,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
        hasher: CredentialHasher,
        tokens: TokenCodec,
    ) -> Self {
        Self {
            users,
            revocations,
            hasher,
            tokens,
        }
    }

    /// Build from the startup auth settings.
    pub fn from_config(
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
        config: &AuthConfig,
    ) -> AppResult<Self> {
        Ok(Self::new(
            users,
            revocations,
            CredentialHasher::new(config.hash_cost)?,
            TokenCodec::new(config),
        ))
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn revocations(&self) -> Arc<dyn RevocationStore> {
        Arc::clone(&self.revocations)
    }

    pub async fn register(&self, registration: &Registration) -> AppResult<User> {
        registration
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let password_hash = self.hasher.hash(&registration.password)?;
        let row = self
            .users
            .create_user(NewUser {
                username: &registration.username,
                email: &registration.email,
                password_hash: &password_hash,
            })
            .await?;

        info!(user_id = %row.id, "user registered");
        Ok(row.into())
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, credentials: &Credentials) -> AppResult<String> {
        let user = self
            .users
            .find_user_by_email(&credentials.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.hasher.verify(&credentials.password, &user.password_hash)? {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, &user.email, Utc::now())?;
        info!(user_id = %user.id, token = %token_fingerprint(&token), "token issued");
        Ok(token)
    }

    /// Revoke the presented token until its own expiry. Repeating the call
    /// succeeds, and so does revoking an expired token we signed.
    pub async fn logout(&self, authorization: Option<&str>) -> AppResult<()> {
        let token = authorization
            .and_then(strip_bearer)
            .ok_or(AppError::InvalidToken)?;

        let expires_at = self.tokens.revocation_expiry(token).map_err(|e| {
            debug!(token = %token_fingerprint(token), error = %e, "logout with unusable token");
            AppError::InvalidToken
        })?;

        self.revocations.record(token, expires_at).await?;
        info!(token = %token_fingerprint(token), %expires_at, "token revoked");
        Ok(())
    }

    /// Revocation gate run after signature and expiry verification. A missing
    /// header is left to the verification step to reject.
    pub async fn admission_check(&self, authorization: Option<&str>) -> AppResult<()> {
        let Some(token) = authorization.and_then(strip_bearer) else {
            return Ok(());
        };
        if self.revocations.is_revoked(token).await? {
            debug!(token = %token_fingerprint(token), "revoked token presented");
            return Err(AppError::TokenRevoked);
        }
        Ok(())
    }

    /// Full admission for a protected route: header present, signature and
    /// expiry valid, not revoked.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Claims> {
        let token = authorization
            .and_then(strip_bearer)
            .ok_or(AppError::InvalidToken)?;
        let claims = self.tokens.verify(token, now)?;
        self.admission_check(authorization).await?;
        Ok(claims)
    }
}
