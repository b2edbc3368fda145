/// Hugging Face hosted inference API (text generation)
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

use super::{non_empty, post_json, AiProvider, ProviderError, Tier};

const MAX_NEW_TOKENS: u32 = 500;

#[derive(Clone)]
pub struct HuggingFaceProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct Generation {
    #[serde(default)]
    generated_text: String,
}

impl HuggingFaceProvider {
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
impl AiProvider for HuggingFaceProvider {
    fn tier(&self) -> Tier {
        Tier::HuggingFace
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;
        let url = format!("{}/models/{}", self.api_url.trim_end_matches('/'), self.model);

        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": MAX_NEW_TOKENS,
                "return_full_text": false,
            }
        });

        let request = self.http_client.post(&url).bearer_auth(api_key);
        let generations: Vec<Generation> = post_json(request, &body).await?;

        let text = generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .unwrap_or_default();

        non_empty(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    #[tokio::test]
    async fn test_returns_generated_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/mistralai/Mistral-7B-Instruct-v0.2"))
            .and(body_partial_json(json!({ "parameters": { "return_full_text": false } })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "generated_text": "[\"Alien\"]" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = HuggingFaceProvider::new(
            HttpClient::new(),
            Some("hf_test".to_string()),
            server.uri(),
            "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
        );

        assert_eq!(provider.complete("hi").await.unwrap(), "[\"Alien\"]");
    }

    #[tokio::test]
    async fn test_model_loading_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": "Model is currently loading",
                "estimated_time": 20.0
            })))
            .mount(&server)
            .await;

        let provider = HuggingFaceProvider::new(
            HttpClient::new(),
            Some("hf_test".to_string()),
            server.uri(),
            "some/model".to_string(),
        );

        let err = provider.complete("hi").await.unwrap_err();
        assert!(err.is_transient());
    }
}
