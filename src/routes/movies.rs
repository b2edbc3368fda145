use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::extract::{AppJson, AppQuery};
use crate::{
    error::{AppError, AppResult},
    services::{catalog, metadata::PosterInfo},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub movies: Vec<&'static str>,
    pub query: String,
    pub total_found: usize,
}

#[derive(Debug, Deserialize)]
pub struct PosterRequest {
    #[serde(default)]
    title: String,
}

/// Handler for catalog title search; short queries return no movies
pub async fn search(AppQuery(params): AppQuery<SearchQuery>) -> Json<SearchResponse> {
    let query = params.q.trim().to_lowercase();
    let movies = catalog::search(&query).unwrap_or_default();

    Json(SearchResponse {
        total_found: movies.len(),
        movies,
        query,
    })
}

/// Poster and genres for a title, never failing on upstream errors
pub async fn poster(
    State(state): State<AppState>,
    AppJson(request): AppJson<PosterRequest>,
) -> AppResult<Json<PosterInfo>> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Movie title is required".to_string()));
    }

    Ok(Json(state.metadata.lookup_poster(title).await))
}
