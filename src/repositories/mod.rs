//! Storage seams for the session core: users and the revocation deny-list.
//!
//! `PgRepository` is the production backend; `MemoryRepository` backs the
//! unit and HTTP tests.

mod memory_repo;
mod pg_repo;

pub use memory_repo::MemoryRepository;
pub use pg_repo::PgRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{NewUser, UserRow};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `AppError::DuplicateCredential` when the
    /// username or email is taken.
    async fn create_user(&self, user: NewUser<'_>) -> AppResult<UserRow>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRow>>;
}

#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Add a token to the deny-list. Recording an already revoked token succeeds.
    async fn record(&self, token: &str, expires_at: DateTime<Utc>) -> AppResult<()>;

    /// Unknown tokens are not revoked.
    async fn is_revoked(&self, token: &str) -> AppResult<bool>;

    /// Drop entries whose token has expired anyway. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
