//! Deny-list entries for logged-out tokens.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RevokedToken {
    pub id: i64,
    pub token: String,
    /// The token's own expiry; the row is useless after this.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RevokedToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
