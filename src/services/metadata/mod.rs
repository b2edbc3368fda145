/// Movie metadata enrichment
///
/// Sources are tried in order (TMDb, then OMDb). A source that errors or has
/// no match hands over to the next one; when all are exhausted the title gets
/// the fallback record. Enrichment never fails a request.
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::AppResult,
    models::{MovieDetails, Recommendation},
};

pub mod omdb;
pub mod tmdb;

pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;

const DETAILS_CACHE_TTL: u64 = 604800; // 1 week

/// A source of movie metadata looked up by title
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short name used in cache keys and logs
    fn source(&self) -> &'static str;

    /// Metadata for the best match, or `None` if the source has no match
    async fn lookup(&self, title: &str) -> AppResult<Option<MovieDetails>>;
}

/// Poster lookup response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterInfo {
    pub poster_url: String,
    pub genres: Vec<String>,
}

#[derive(Clone)]
pub struct MetadataService {
    providers: Vec<Arc<dyn MetadataProvider>>,
    cache: Option<Cache>,
    concurrency: usize,
}

impl MetadataService {
    pub fn new(providers: Vec<Arc<dyn MetadataProvider>>, cache: Option<Cache>, concurrency: usize) -> Self {
        Self {
            providers,
            cache,
            concurrency: concurrency.max(1),
        }
    }

    /// TMDb and OMDb for whichever keys are configured
    pub fn from_config(config: &Config, http_client: reqwest::Client, cache: Option<Cache>) -> Self {
        let mut providers: Vec<Arc<dyn MetadataProvider>> = Vec::new();

        if let Some(key) = &config.tmdb_api_key {
            providers.push(Arc::new(TmdbProvider::new(
                http_client.clone(),
                key.clone(),
                config.tmdb_api_url.clone(),
            )));
        }
        if let Some(key) = &config.omdb_api_key {
            providers.push(Arc::new(OmdbProvider::new(
                http_client,
                key.clone(),
                config.omdb_api_url.clone(),
            )));
        }

        if providers.is_empty() {
            tracing::warn!("No metadata API keys configured, movies will use the fallback poster");
        }

        Self::new(providers, cache, config.metadata_concurrency)
    }

    pub fn sources(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.source()).collect()
    }

    /// Best available metadata for `title`, or the fallback record
    pub async fn lookup(&self, title: &str) -> MovieDetails {
        let title = title.trim();

        for provider in &self.providers {
            let key = CacheKey::MovieDetails {
                source: provider.source(),
                title: title.to_string(),
            };

            let result: AppResult<Option<MovieDetails>> =
                cached!(self.cache.as_ref(), key, DETAILS_CACHE_TTL, provider.lookup(title));

            match result {
                Ok(Some(details)) => return details,
                Ok(None) => {
                    tracing::debug!(title, source = provider.source(), "No metadata match");
                }
                Err(e) => {
                    tracing::warn!(title, source = provider.source(), error = %e, "Metadata lookup failed");
                }
            }
        }

        MovieDetails::fallback()
    }

    /// Looks up every title with at most `concurrency` requests in flight.
    /// Results are in input order.
    pub async fn enrich_batch(&self, titles: &[String]) -> Vec<Recommendation> {
        stream::iter(titles.iter().cloned())
            .map(|title| async move {
                let details = self.lookup(&title).await;
                Recommendation { title, details }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }

    pub async fn lookup_poster(&self, title: &str) -> PosterInfo {
        let details = self.lookup(title).await;
        PosterInfo {
            poster_url: details
                .poster_url
                .unwrap_or_else(|| crate::models::FALLBACK_POSTER.to_string()),
            genres: details.genres,
        }
    }
}
