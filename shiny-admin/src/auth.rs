//! Session cookie handling
//!
//! `session_middleware` runs on every request: it reads the session cookie,
//! resolves it to a live session and active user, and stores the result as a
//! [`SessionContext`] request extension. Handlers extract `SessionContext`
//! (rejecting with 401) or `Option<SessionContext>` and decide themselves.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};
use shiny_common::config::ServerConfig;
use shiny_common::db::User;
use shiny_common::sessions;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

/// The authenticated session behind a request
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_key: String,
    pub user: User,
}

/// Attach a [`SessionContext`] when the request carries a valid session cookie
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(key) = session_key(request.headers(), &state.config.session_cookie_name) {
        match sessions::load_authenticated(&state.db, &key).await {
            Ok(Some((session, user))) => {
                request.extensions_mut().insert(SessionContext {
                    session_key: session.session_key,
                    user,
                });
            }
            Ok(None) => debug!("Ignoring unknown or expired session cookie"),
            Err(e) => warn!("Session lookup failed: {}", e),
        }
    }

    next.run(request).await
}

/// Value of the named cookie, if present in any `Cookie` header
pub fn session_key(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// `Set-Cookie` value handing a new session key to the browser
pub fn session_cookie(config: &ServerConfig, session_key: &str) -> String {
    Cookie::build((config.session_cookie_name.clone(), session_key.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .max_age(cookie::time::Duration::seconds(config.session_ttl_seconds))
        .build()
        .to_string()
}

/// `Set-Cookie` value clearing the session cookie
pub fn removal_cookie(config: &ServerConfig) -> String {
    let mut cookie = Cookie::build((config.session_cookie_name.clone(), ""))
        .path("/")
        .build();
    cookie.make_removal();
    cookie.to_string()
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
