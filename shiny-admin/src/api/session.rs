//! Session endpoints called by the embedded analytical application
//!
//! Both answer 404 (`{"detail": "Not found."}`) to unauthenticated callers
//! and to any method other than the one they serve.

use axum::{
    extract::{FromRequest, Request},
    http::{header, Method},
    routing::any,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use shiny_common::db::User;
use tracing::debug;

use crate::auth::SessionContext;
use crate::error::ApiError;
use crate::AppState;

/// Current session key and profile of the caller
#[derive(Debug, Serialize)]
pub struct UserSessionResponse {
    pub session: String,
    pub user: User,
}

/// Identity asserted by the client
#[derive(Debug, Default, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "session-id")]
    pub session_id: Option<String>,
    pub user: Option<String>,
    /// Sent by the client, not compared
    pub group: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VerifyResponse {
    #[serde(rename = "session-valid")]
    pub session_valid: bool,
    #[serde(rename = "user-valid")]
    pub user_valid: bool,
}

/// Compare an asserted session id and username against the real session.
///
/// The two checks are independent.
pub fn cross_validate(session: &SessionContext, asserted: &VerifyRequest) -> VerifyResponse {
    VerifyResponse {
        session_valid: asserted.session_id.as_deref() == Some(session.session_key.as_str()),
        user_valid: asserted.user.as_deref() == Some(session.user.username.as_str()),
    }
}

/// GET /api/get_user_session/
pub async fn get_user_session(
    method: Method,
    session: Option<SessionContext>,
) -> Result<Json<UserSessionResponse>, ApiError> {
    if method != Method::GET {
        return Err(ApiError::NotFound);
    }
    let session = session.ok_or(ApiError::NotFound)?;

    Ok(Json(UserSessionResponse {
        session: session.session_key,
        user: session.user,
    }))
}

/// POST /api/verify_user_session/
///
/// Accepts a form-encoded or JSON body with `session-id` and `user`.
pub async fn verify_user_session(
    session: Option<SessionContext>,
    request: Request,
) -> Result<Json<VerifyResponse>, ApiError> {
    if request.method() != Method::POST {
        return Err(ApiError::NotFound);
    }
    let session = session.ok_or(ApiError::NotFound)?;

    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let asserted = if is_json {
        Json::<VerifyRequest>::from_request(request, &())
            .await
            .map(|Json(body)| body)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
    } else {
        Form::<VerifyRequest>::from_request(request, &())
            .await
            .map(|Form(body)| body)
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?
    };

    let result = cross_validate(&session, &asserted);
    debug!(
        "Session cross-validation for user {}: {:?}",
        session.user.id, result
    );
    Ok(Json(result))
}

/// Session routes. Registered for every method so that the wrong method
/// gets 404 like a missing session does.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/get_user_session/", any(get_user_session))
        .route("/api/verify_user_session/", any(verify_user_session))
}
