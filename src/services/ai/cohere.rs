/// Cohere chat API, the last hosted tier before the static catalog
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use super::{non_empty, post_json, AiProvider, ProviderError, Tier};

#[derive(Clone)]
pub struct CohereProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    text: String,
}

impl CohereProvider {
    pub fn new(http_client: HttpClient, api_key: Option<String>, api_url: String, model: String) -> Self {
        Self {
            http_client,
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for CohereProvider {
    fn tier(&self) -> Tier {
        Tier::Cohere
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let url = format!("{}/v1/chat", self.api_url.trim_end_matches('/'));

        let body = json!({
            "model": self.model,
            "message": prompt,
        });

        let request = self.http_client.post(&url).bearer_auth(api_key);
        let response: ChatResponse = post_json(request, &body).await?;

        non_empty(response.text)
    }
}
