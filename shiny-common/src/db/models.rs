//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named cluster of users used to aggregate/compare preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

/// A registered user.
///
/// Serializing a `User` yields the public profile: every field except the
/// password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(rename = "group")]
    pub group_id: Option<i64>,
}

/// A stored preference document attributed to a user and optionally a group.
///
/// `scores` is owned by the external analytical application and never
/// inspected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RunPreference {
    pub id: i64,
    #[serde(rename = "user")]
    #[sqlx(rename = "user_id")]
    pub user_id: i64,
    #[serde(rename = "group")]
    #[sqlx(rename = "group_id")]
    pub group_id: Option<i64>,
    #[sqlx(json)]
    pub scores: Value,
}

/// An authenticated server-side session
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    pub session_key: String,
    pub user_id: i64,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds
    pub expires_at: i64,
}
