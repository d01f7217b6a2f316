use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::errors::AppResult;
use crate::utils::{hash_token, utc_now};

#[derive(Debug, Clone, FromRow)]
pub struct StoredRefreshToken {
    pub id: i64,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl StoredRefreshToken {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at > now
    }
}

/// Stores the hash of `token` for `user_id`, valid for `days`.
pub async fn insert(pool: &SqlitePool, user_id: i64, token: &str, days: i64) -> AppResult<()> {
    let now = utc_now();
    sqlx::query("INSERT INTO refresh_tokens (user_id, token_hash, expires_at, revoked, created_at) VALUES (?, ?, ?, 0, ?)")
        .bind(user_id)
        .bind(hash_token(token))
        .bind(now + Duration::days(days))
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find(pool: &SqlitePool, token: &str) -> AppResult<Option<StoredRefreshToken>> {
    let stored = sqlx::query_as::<_, StoredRefreshToken>(
        "SELECT id, user_id, expires_at, revoked FROM refresh_tokens WHERE token_hash = ?",
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;
    Ok(stored)
}

/// Marks a token revoked. Returns false when it already was, so a token
/// raced through two refreshes is honoured only once.
pub async fn revoke(pool: &SqlitePool, id: i64) -> AppResult<bool> {
    let result = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE id = ? AND revoked = 0")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}
