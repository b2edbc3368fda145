/// OMDb title lookup, used when TMDb has nothing
use reqwest::Client as HttpClient;

use super::MetadataProvider;
use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, OmdbMovie},
};

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OmdbProvider {
    pub fn new(http_client: HttpClient, api_key: String, api_url: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbProvider {
    fn source(&self) -> &'static str {
        "omdb"
    }

    async fn lookup(&self, title: &str) -> AppResult<Option<MovieDetails>> {
        let url = format!("{}/", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("apikey", self.api_key.as_str()), ("t", title)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalApi(format!("OMDb returned {}", status)));
        }

        let movie: OmdbMovie = response.json().await?;
        if !movie.is_found() {
            tracing::debug!(
                title,
                reason = movie.error.as_deref().unwrap_or("unknown"),
                "OMDb has no match"
            );
            return Ok(None);
        }

        Ok(Some(movie.into()))
    }
}
