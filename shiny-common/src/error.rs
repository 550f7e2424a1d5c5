//! Common error types for Shiny Admin

use std::collections::BTreeMap;

use thiserror::Error;

/// Common result type for Shiny Admin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Field name -> messages, in the shape returned to API callers
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Common error types across the service and CLI
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A store-level uniqueness constraint rejected the write.
    /// Carries the store's own message.
    #[error("{0}")]
    Constraint(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Field-level validation failure
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Password hashing failure
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Error::Constraint(db_err.message().to_string())
            }
            _ => Error::Database(err),
        }
    }
}

impl Error {
    /// Single-field validation error
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Error::Validation(errors)
    }
}
