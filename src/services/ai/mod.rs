/// Hosted LLM providers and the fallback chain that tries them in order
///
/// Every provider takes a plain text prompt and returns the model's free-text
/// answer. Parsing that answer is the caller's job (see `extract`), so each
/// provider can be exercised in isolation against a mock HTTP server.
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Display, time::Duration};

pub mod chain;
pub mod cohere;
pub mod extract;
pub mod gemini;
pub mod huggingface;
pub mod openai;
pub mod prompt;

pub use chain::{ChainExhausted, ChainOutcome, ProviderChain, TierFailure};

/// Where a result came from. `Static` is the built-in catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Gemini,
    OpenAi,
    HuggingFace,
    Cohere,
    Static,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Gemini => "gemini",
            Tier::OpenAi => "openai",
            Tier::HuggingFace => "huggingface",
            Tier::Cohere => "cohere",
            Tier::Static => "static",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a provider attempt produced nothing usable
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("cooling down after rate limit")]
    CoolingDown,

    #[error("upstream returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("response had no text")]
    EmptyResponse,

    #[error("no usable JSON in response: {0}")]
    Unparseable(String),
}

impl ProviderError {
    /// Classifies a non-success HTTP response
    pub fn from_status(status: u16, body: String) -> Self {
        let lowered = body.to_lowercase();
        if status == 429 || lowered.contains("quota") || lowered.contains("rate limit") {
            ProviderError::RateLimited(truncate(&body, 200))
        } else {
            ProviderError::Status {
                status,
                body: truncate(&body, 200),
            }
        }
    }

    /// Failures worth retrying against the same provider
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

/// A hosted text-generation API
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    fn tier(&self) -> Tier;

    /// Sends the prompt and returns the model's raw text answer
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// POSTs `body` and decodes a JSON reply, classifying HTTP failures
pub(crate) async fn post_json<B, R>(request: reqwest::RequestBuilder, body: &B) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = request.json(body).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::from_status(status.as_u16(), body));
    }

    Ok(response.json::<R>().await?)
}

/// Rejects blank model output
pub(crate) fn non_empty(text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(text)
    }
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.push('…');
        cut
    }
}
