//! HTTP error responses for the JSON API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shiny_common::{Error, FieldErrors};
use thiserror::Error;
use tracing::error;

/// Errors returned by API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing resource, absent session on the session endpoints, or a
    /// method those endpoints do not serve
    #[error("Not found.")]
    NotFound,

    /// Preference API called without a session
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,

    /// Field-level validation errors
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Store uniqueness violation, carrying the store's message
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(errors) => ApiError::Validation(errors),
            Error::Constraint(message) => ApiError::Conflict(message),
            Error::NotFound(_) => ApiError::NotFound,
            Error::InvalidInput(message) => ApiError::BadRequest(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
            }
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::Internal(message) => {
                error!("Request failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
            other => {
                let status = match &other {
                    ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    ApiError::Conflict(_) => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, Json(json!({ "error": other.to_string() }))).into_response()
            }
        }
    }
}
