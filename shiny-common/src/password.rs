//! Password hashing
//!
//! Argon2id with a random 16 byte salt, stored as a PHC string.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;

use crate::{Error, Result};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a plaintext password into a PHC string.
///
/// Argon2 runs on the blocking pool.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| Error::Internal(format!("password hashing task failed: {}", e)))?
}

/// Check a plaintext password against a stored PHC string.
///
/// An unparseable stored hash (e.g. an unusable password) never verifies.
pub async fn verify_password(password: &str, encoded: &str) -> Result<bool> {
    let password = password.to_owned();
    let encoded = encoded.to_owned();
    tokio::task::spawn_blocking(move || verify_blocking(&password, &encoded))
        .await
        .map_err(|e| Error::Internal(format!("password verification task failed: {}", e)))
}

fn hash_blocking(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| Error::PasswordHash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

fn verify_blocking(password: &str, encoded: &str) -> bool {
    match PasswordHash::new(encoded) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Validate a new password pair, returning field-level messages.
///
/// Mirrors the usual form rules: both entries must match, be long enough and
/// not be entirely numeric or equal to the username.
pub fn validate_new_password(username: &str, password1: &str, password2: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password1 != password2 {
        errors.push("The two password fields didn't match.".to_string());
        return errors;
    }
    if password1.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password1.is_empty() && password1.chars().all(|c| c.is_ascii_digit()) {
        errors.push("This password is entirely numeric.".to_string());
    }
    if !username.is_empty() && password1.eq_ignore_ascii_case(username) {
        errors.push("The password is too similar to the username.".to_string());
    }

    errors
}
