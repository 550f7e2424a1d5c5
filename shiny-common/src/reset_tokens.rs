//! Single-use password reset tokens

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::sessions::generate_key;
use crate::Result;

/// Length of generated reset tokens
pub const RESET_TOKEN_LENGTH: usize = 40;

/// Issue a token for `user_id` valid for `ttl_seconds`
pub async fn issue_token(pool: &SqlitePool, user_id: i64, ttl_seconds: i64) -> Result<String> {
    let token = generate_key(RESET_TOKEN_LENGTH);
    let now = Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO password_reset_tokens (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&token)
    .bind(user_id)
    .bind(now)
    .bind(now + ttl_seconds)
    .execute(pool)
    .await?;

    info!("Issued password reset token for user {}", user_id);
    Ok(token)
}

/// Whether `token` is an unused, unexpired token belonging to `user_id`
pub async fn is_valid(pool: &SqlitePool, user_id: i64, token: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM password_reset_tokens WHERE token = ? AND user_id = ? AND used = 0 AND expires_at > ?",
    )
    .bind(token)
    .bind(user_id)
    .bind(Utc::now().timestamp())
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}

/// Mark the token used. Returns false if it was not valid at that moment,
/// so two concurrent confirmations cannot both succeed.
pub async fn consume(pool: &SqlitePool, user_id: i64, token: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used = 1 WHERE token = ? AND user_id = ? AND used = 0 AND expires_at > ?",
    )
    .bind(token)
    .bind(user_id)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Remove used and expired tokens
pub async fn purge_stale(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM password_reset_tokens WHERE used = 1 OR expires_at <= ?")
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
