use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::extract::{AppJson, AppPath};
use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{MovieStatus, UserMovie},
    services::user_movies::{self, UpsertRequest, WatchedOutcome},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedRequest {
    pub movie_title: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MovieStatus,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub order: Vec<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<UserMovie>>> {
    Ok(Json(user_movies::list(state.store.as_ref(), user.id).await?))
}

pub async fn upsert(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<UpsertRequest>,
) -> AppResult<Json<UserMovie>> {
    Ok(Json(user_movies::upsert(state.store.as_ref(), user.id, request).await?))
}

pub async fn add_watched(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<WatchedRequest>,
) -> AppResult<Json<WatchedOutcome>> {
    let outcome = user_movies::add_watched(state.store.as_ref(), user.id, &request.movie_title).await?;
    Ok(Json(outcome))
}

pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(movie_id): AppPath<Uuid>,
    AppJson(request): AppJson<StatusRequest>,
) -> AppResult<Json<UserMovie>> {
    let movie = user_movies::set_status(state.store.as_ref(), user.id, movie_id, request.status).await?;
    Ok(Json(movie))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(movie_id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    user_movies::delete(state.store.as_ref(), user.id, movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<OrderRequest>,
) -> AppResult<Json<Value>> {
    user_movies::reorder(state.store.as_ref(), user.id, &request.order).await?;
    Ok(Json(json!({ "success": true })))
}
