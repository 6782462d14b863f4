//! PostgreSQL-backed stores with a bounded time per call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::db::{self, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UserRow};

use super::{RevocationStore, UserStore};

/// Users and revoked tokens in Postgres. Uniqueness and idempotency come from
/// the tables' unique constraints, so no locking happens here.
#[derive(Clone)]
pub struct PgRepository {
    pool: DbPool,
    timeout: Duration,
}

impl PgRepository {
    pub fn new(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// A timed-out call is a storage failure, never an implicit success.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "store call timed out");
                Err(AppError::Storage(format!("{} timed out", op)))
            }
        }
    }
}

#[async_trait]
impl UserStore for PgRepository {
    async fn create_user(&self, user: NewUser<'_>) -> AppResult<UserRow> {
        self.bounded("user_create", db::user_create(&self.pool, user))
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        self.bounded("user_find_by_email", db::user_find_by_email(&self.pool, email))
            .await
    }
}

#[async_trait]
impl RevocationStore for PgRepository {
    async fn record(&self, token: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        self.bounded(
            "revoked_token_insert",
            db::revoked_token_insert(&self.pool, token, expires_at),
        )
        .await
    }

    async fn is_revoked(&self, token: &str) -> AppResult<bool> {
        self.bounded("revoked_token_exists", db::revoked_token_exists(&self.pool, token))
            .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.bounded(
            "revoked_tokens_purge_expired",
            db::revoked_tokens_purge_expired(&self.pool, now),
        )
        .await
    }
}
