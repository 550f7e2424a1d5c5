//! User store: registration, credential checks and profile lookups

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};
use validator::Validate;

use crate::db::User;
use crate::password::{hash_password, validate_new_password, verify_password};
use crate::validation;
use crate::{groups, Error, FieldErrors, Result};

const USER_COLUMNS: &str = "id, username, password_hash, email, first_name, last_name, \
     is_active, is_staff, is_superuser, date_joined, last_login, group_id";

/// Registration input as submitted by the sign-up form
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Registration {
    #[validate(
        length(max = 150, message = "Ensure this value has at most 150 characters."),
        custom(function = "validation::username_characters")
    )]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password1: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password2: String,
    #[validate(custom(function = "validation::optional_email"))]
    pub email: String,
    /// Raw group field; empty means no group
    pub group: String,
}

/// Fully validated user to insert
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub group_id: Option<i64>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

/// Validate a registration and create the user.
///
/// All problems are collected into one `Error::Validation`; nothing is
/// written unless every field is valid.
pub async fn register_user(pool: &SqlitePool, form: &Registration) -> Result<User> {
    let form = Registration {
        username: form.username.trim().to_string(),
        email: form.email.trim().to_string(),
        ..form.clone()
    };
    let mut errors = validation::check(&form);
    let username = form.username.as_str();

    if !errors.contains_key("username") && get_user_by_username(pool, username).await?.is_some() {
        push(
            &mut errors,
            "username",
            "A user with that username already exists.".to_string(),
        );
    }

    if !form.password1.is_empty() && !form.password2.is_empty() {
        for message in validate_new_password(username, &form.password1, &form.password2) {
            push(&mut errors, "password2", message);
        }
    }

    let group_id = match form.group.trim() {
        "" => None,
        raw => match raw.parse::<i64>() {
            Ok(id) if groups::get_group(pool, id).await?.is_some() => Some(id),
            _ => {
                push(
                    &mut errors,
                    "group",
                    "Select a valid choice. That choice is not one of the available choices."
                        .to_string(),
                );
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(Error::Validation(errors));
    }

    create_user(
        pool,
        NewUser {
            username: username.to_string(),
            password: form.password1,
            email: form.email,
            group_id,
            ..Default::default()
        },
    )
    .await
}

/// Insert a user. The username UNIQUE constraint is reported as a field error.
pub async fn create_user(pool: &SqlitePool, new_user: NewUser) -> Result<User> {
    let password_hash = hash_password(&new_user.password).await?;
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, email, is_staff, is_superuser, date_joined, group_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&new_user.username)
    .bind(&password_hash)
    .bind(&new_user.email)
    .bind(new_user.is_staff)
    .bind(new_user.is_superuser)
    .bind(now)
    .bind(new_user.group_id)
    .execute(pool)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(e) => {
            return Err(match Error::from(e) {
                Error::Constraint(_) => {
                    Error::field("username", "A user with that username already exists.")
                }
                other => other,
            })
        }
    };

    info!("Created user {} ({})", id, new_user.username);

    get_user(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("user {} vanished after insert", id)))
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Active users with the given email (case-insensitive)
pub async fn find_active_by_email(pool: &SqlitePool, email: &str) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ? COLLATE NOCASE AND email != '' AND is_active = 1",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_all(pool)
    .await?;

    Ok(users)
}

pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
        .fetch_all(pool)
        .await?;

    Ok(users)
}

/// Check credentials.
///
/// Returns `None` for an unknown user, a wrong password or an inactive
/// account alike.
pub async fn authenticate(pool: &SqlitePool, username: &str, password: &str) -> Result<Option<User>> {
    let Some(user) = get_user_by_username(pool, username).await? else {
        warn!("Login rejected: unknown user");
        return Ok(None);
    };

    if !user.is_active || !verify_password(password, &user.password_hash).await? {
        warn!("Login rejected for user {}", user.id);
        return Ok(None);
    }

    Ok(Some(user))
}

/// Stamp `last_login` with the current time
pub async fn record_login(pool: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_password(pool: &SqlitePool, user_id: i64, password: &str) -> Result<()> {
    let password_hash = hash_password(password).await?;

    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("user {}", user_id)));
    }

    Ok(())
}

/// Delete a user. Their preferences, sessions and reset tokens go with them.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("user {}", user_id)));
    }

    info!("Deleted user {}", user_id);
    Ok(())
}
