//! shiny-admin library - account, session and preference service
//!
//! Serves the sign-up/login pages, the wrapper page embedding the external
//! analytical application, and the JSON endpoints that application calls
//! back into (session cross-validation, run preference storage).

use std::sync::Arc;

use axum::Router;
use shiny_common::config::ServerConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod auth;
pub mod cli;
pub mod error;
pub mod pages;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: ServerConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}

/// Build application router
///
/// Every route sees the session middleware; handlers decide for themselves
/// whether an absent session is an error.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    Router::new()
        .merge(pages::page_routes())
        .merge(api::session_routes())
        .merge(api::preference_routes())
        .merge(api::health_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
