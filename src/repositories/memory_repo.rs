//! In-process stores used by the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, RevokedToken, UserRow};

use super::{RevocationStore, UserStore};

/// Users and revoked tokens held in memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    users: Arc<RwLock<HashMap<Uuid, UserRow>>>,
    revoked: Arc<RwLock<HashMap<String, RevokedToken>>>,
    next_revocation_id: Arc<AtomicI64>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn revoked_count(&self) -> usize {
        self.revoked.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryRepository {
    async fn create_user(&self, user: NewUser<'_>) -> AppResult<UserRow> {
        // Check and insert under one write lock, like a unique index would.
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(AppError::DuplicateCredential);
        }
        let row = UserRow {
            id: Uuid::new_v4(),
            username: user.username.to_string(),
            email: user.email.to_string(),
            password_hash: user.password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserRow>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl RevocationStore for MemoryRepository {
    async fn record(&self, token: &str, expires_at: DateTime<Utc>) -> AppResult<()> {
        let mut revoked = self.revoked.write().await;
        revoked.entry(token.to_string()).or_insert_with(|| RevokedToken {
            id: self.next_revocation_id.fetch_add(1, Ordering::Relaxed) + 1,
            token: token.to_string(),
            expires_at,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> AppResult<bool> {
        Ok(self.revoked.read().await.contains_key(token))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut revoked = self.revoked.write().await;
        let before = revoked.len();
        revoked.retain(|_, entry| !entry.is_expired(now));
        Ok((before - revoked.len()) as u64)
    }
}
