use axum::{extract::State, Json};
use serde::Deserialize;

use super::extract::AppJson;
use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::MovieRatings,
    services::onboarding::{self, CasualQuestion, StepOutcome, SurveyInput, SurveyOutcome},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RatingsRequest {
    pub ratings: MovieRatings,
}

#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    pub answers: Vec<String>,
}

pub async fn casual_questions() -> Json<&'static [CasualQuestion]> {
    Json(onboarding::casual_questions())
}

pub async fn survey(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(input): AppJson<SurveyInput>,
) -> AppResult<Json<SurveyOutcome>> {
    let outcome = onboarding::submit_survey(state.store.as_ref(), &state.ai, &user, input).await?;
    Ok(Json(outcome))
}

pub async fn ratings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<RatingsRequest>,
) -> AppResult<Json<StepOutcome>> {
    let outcome = onboarding::submit_ratings(state.store.as_ref(), &user, request.ratings).await?;
    Ok(Json(outcome))
}

pub async fn casual_answers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<AnswersRequest>,
) -> AppResult<Json<StepOutcome>> {
    let outcome =
        onboarding::submit_casual_answers(state.store.as_ref(), &user, request.answers).await?;
    Ok(Json(outcome))
}
