//! Run preference REST endpoints
//!
//! `/api/preference/` lists (filtered by `user` / `group` query parameters)
//! and creates; `/api/preference/:id/` reads, replaces, patches and deletes.
//! Item lookups happen inside the filtered set: GET filters from the query
//! string, PUT/PATCH from the body, DELETE is unfiltered.
//! All of them require a session.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use shiny_common::db::RunPreference;
use shiny_common::preferences::{self, PreferenceChanges, PreferenceFilter};

use crate::auth::SessionContext;
use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

fn body(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Non-integer ids never match anything
fn item_id(raw: &str) -> ApiResult<i64> {
    raw.parse::<i64>().map_err(|_| ApiError::NotFound)
}

/// GET /api/preference/
pub async fn list_preferences(
    State(state): State<AppState>,
    _session: SessionContext,
    Query(filter): Query<PreferenceFilter>,
) -> ApiResult<Json<Vec<RunPreference>>> {
    let conditions = filter.resolve()?;
    let rows = preferences::list(&state.db, &conditions).await?;
    Ok(Json(rows))
}

/// POST /api/preference/
pub async fn create_preference(
    State(state): State<AppState>,
    _session: SessionContext,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RunPreference>)> {
    let body = body(payload)?;
    let changes = PreferenceChanges::from_json(&body, false)?;
    let created = preferences::create(&state.db, changes).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/preference/:id/
pub async fn retrieve_preference(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<String>,
    Query(filter): Query<PreferenceFilter>,
) -> ApiResult<Json<RunPreference>> {
    let id = item_id(&id)?;
    let conditions = filter.resolve()?;
    let row = preferences::get(&state.db, id, &conditions)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(row))
}

async fn apply_update(
    state: &AppState,
    id: &str,
    payload: Result<Json<Value>, JsonRejection>,
    partial: bool,
) -> ApiResult<Json<RunPreference>> {
    let id = item_id(id)?;
    let body = body(payload)?;

    let conditions = PreferenceFilter::from_json(&body).resolve()?;
    if preferences::get(&state.db, id, &conditions).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let changes = PreferenceChanges::from_json(&body, partial)?;
    let updated = preferences::update(&state.db, id, &conditions, changes).await?;
    Ok(Json(updated))
}

/// PUT /api/preference/:id/
pub async fn update_preference(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<RunPreference>> {
    apply_update(&state, &id, payload, false).await
}

/// PATCH /api/preference/:id/
pub async fn partial_update_preference(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<RunPreference>> {
    apply_update(&state, &id, payload, true).await
}

/// DELETE /api/preference/:id/
pub async fn destroy_preference(
    State(state): State<AppState>,
    _session: SessionContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = item_id(&id)?;
    preferences::delete(&state.db, id, &[]).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn preference_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/preference/",
            get(list_preferences).post(create_preference),
        )
        .route(
            "/api/preference/:id/",
            get(retrieve_preference)
                .put(update_preference)
                .patch(partial_update_preference)
                .delete(destroy_preference),
        )
}
