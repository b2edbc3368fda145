use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    services::insights::{self, Insights},
    state::AppState,
};

pub async fn insights(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Insights>> {
    Ok(Json(insights::for_user(state.store.as_ref(), user.id).await?))
}
