use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::extract::AppJson;
use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::User,
    services::insights::{count_lists, ListCounts},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: uuid::Uuid,
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: User,
    pub list_counts: ListCounts,
}

fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::InvalidInput("a valid email is required".to_string())),
    }
}

/// Creates the user on first sign-in and opens a session
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(request): AppJson<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    let email = normalize_email(&request.email)?;
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let user = state.store.find_or_create_user(&email, name).await?;
    let token = state.store.create_session(user.id).await?;

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(Json(SignInResponse { token, user }))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<ProfileResponse>> {
    let movies = state.store.list_user_movies(user.id).await?;
    Ok(Json(ProfileResponse {
        list_counts: count_lists(&movies),
        user,
    }))
}
