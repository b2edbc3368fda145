/// OpenAI chat completions API
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use super::{non_empty, post_json, AiProvider, ProviderError, Tier};

#[derive(Clone)]
pub struct OpenAiProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAiProvider {
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
impl AiProvider for OpenAiProvider {
    fn tier(&self) -> Tier {
        Tier::OpenAi
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let url = format!("{}/v1/chat/completions", self.api_url.trim_end_matches('/'));

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.7,
        });

        let request = self.http_client.post(&url).bearer_auth(api_key);
        let response: ChatCompletionResponse = post_json(request, &body).await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        non_empty(text)
    }
}
