use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    services::recommendations::{self, RecommendationResponse},
    state::AppState,
};

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<RecommendationResponse>> {
    let response =
        recommendations::recommend(state.store.as_ref(), &state.ai, &state.metadata, user.id).await?;
    Ok(Json(response))
}
