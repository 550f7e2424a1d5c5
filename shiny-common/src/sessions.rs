//! Server-side session store
//!
//! A session key is 32 random lowercase alphanumeric characters, handed to
//! the browser in the session cookie and stored here with its owner and
//! expiry. Expired rows are ignored on load and purged at startup.

use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::db::{Session, User};
use crate::{users, Result};

/// Length of generated session keys
pub const SESSION_KEY_LENGTH: usize = 32;

const KEY_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random key from the lowercase alphanumeric alphabet
pub fn generate_key(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| KEY_CHARS[rng.gen_range(0..KEY_CHARS.len())] as char)
        .collect()
}

fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// Create a session for `user_id` lasting `ttl_seconds`
pub async fn create_session(pool: &SqlitePool, user_id: i64, ttl_seconds: i64) -> Result<Session> {
    let now = now_secs();
    let session = Session {
        session_key: generate_key(SESSION_KEY_LENGTH),
        user_id,
        created_at: now,
        expires_at: now + ttl_seconds,
    };

    sqlx::query(
        "INSERT INTO sessions (session_key, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&session.session_key)
    .bind(session.user_id)
    .bind(session.created_at)
    .bind(session.expires_at)
    .execute(pool)
    .await?;

    debug!("Created session for user {}", user_id);
    Ok(session)
}

/// Load an unexpired session
pub async fn get_session(pool: &SqlitePool, session_key: &str) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(
        "SELECT session_key, user_id, created_at, expires_at FROM sessions WHERE session_key = ? AND expires_at > ?",
    )
    .bind(session_key)
    .bind(now_secs())
    .fetch_optional(pool)
    .await?;

    Ok(session)
}

/// Resolve a session key to its session and active user
pub async fn load_authenticated(
    pool: &SqlitePool,
    session_key: &str,
) -> Result<Option<(Session, User)>> {
    let Some(session) = get_session(pool, session_key).await? else {
        return Ok(None);
    };

    match users::get_user(pool, session.user_id).await? {
        Some(user) if user.is_active => Ok(Some((session, user))),
        _ => Ok(None),
    }
}

pub async fn delete_session(pool: &SqlitePool, session_key: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE session_key = ?")
        .bind(session_key)
        .execute(pool)
        .await?;

    Ok(())
}

/// Drop every session belonging to a user (after a password change)
pub async fn delete_user_sessions(pool: &SqlitePool, user_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Remove expired sessions; returns how many were removed
pub async fn purge_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now_secs())
        .execute(pool)
        .await?;

    let removed = result.rows_affected();
    if removed > 0 {
        info!("Purged {} expired sessions", removed);
    }
    Ok(removed)
}
