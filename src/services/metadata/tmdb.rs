/// TMDb movie metadata
///
/// API flow:
/// 1. Search: /3/search/movie?query= → first hit gives id, poster, release date
/// 2. Details: /3/movie/{id} → vote average, genres
/// 3. Credits: /3/movie/{id}/credits → director, lead actor
///
/// Details and credits are fetched concurrently; either may fail without
/// discarding the search hit.
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;

use super::MetadataProvider;
use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, TmdbCredits, TmdbMovieDetails, TmdbSearchResponse},
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDb {} returned {}: {}",
                path, status, body
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    fn source(&self) -> &'static str {
        "tmdb"
    }

    async fn lookup(&self, title: &str) -> AppResult<Option<MovieDetails>> {
        let search: TmdbSearchResponse = self.get("/3/search/movie", &[("query", title)]).await?;

        let Some(movie) = search.results.into_iter().next() else {
            tracing::debug!(title, "TMDb search returned no results");
            return Ok(None);
        };

        let details_path = format!("/3/movie/{}", movie.id);
        let credits_path = format!("/3/movie/{}/credits", movie.id);
        let (details, credits) = tokio::join!(
            self.get::<TmdbMovieDetails>(&details_path, &[]),
            self.get::<TmdbCredits>(&credits_path, &[]),
        );

        let details = details
            .map_err(|e| tracing::warn!(title, error = %e, "TMDb details lookup failed"))
            .ok();
        let credits = credits
            .map_err(|e| tracing::warn!(title, error = %e, "TMDb credits lookup failed"))
            .ok();

        Ok(Some(MovieDetails::from_tmdb(&movie, details, credits)))
    }
}
