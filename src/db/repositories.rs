//! Queries: users and revoked tokens.

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UserRow};
use chrono::{DateTime, Utc};

use super::DbPool;

// ---- User ----

/// Insert a user. A unique violation on username or email is a duplicate, not a failure.
pub async fn user_create(pool: &DbPool, user: NewUser<'_>) -> AppResult<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, email, password_hash, created_at
        "#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::DuplicateCredential,
        other => AppError::Db(other),
    })?;
    Ok(row)
}

pub async fn user_find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ---- Revoked tokens ----

pub async fn revoked_token_insert(
    pool: &DbPool,
    token: &str,
    expires_at: DateTime<Utc>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO revoked_tokens (token, expires_at)
        VALUES ($1, $2)
        ON CONFLICT (token) DO NOTHING
        "#,
    )
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn revoked_token_exists(pool: &DbPool, token: &str) -> AppResult<bool> {
    let row: (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token = $1)")
            .bind(token)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn revoked_tokens_purge_expired(pool: &DbPool, now: DateTime<Utc>) -> AppResult<u64> {
    let r = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(r.rows_affected())
}
