use std::{sync::Arc, sync::Mutex, time::Duration};
use tokio::time::Instant;

use super::{
    cohere::CohereProvider, gemini::GeminiProvider, huggingface::HuggingFaceProvider,
    openai::OpenAiProvider, truncate, AiProvider, ProviderError, Tier,
};
use crate::config::Config;

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// One failed tier, kept so callers can report what went wrong
#[derive(Debug, Clone, PartialEq)]
pub struct TierFailure {
    pub tier: Tier,
    pub error: ProviderError,
}

/// A parsed result and the tier that produced it
#[derive(Debug, Clone)]
pub struct ChainOutcome<T> {
    pub value: T,
    pub tier: Tier,
    /// Tiers tried before `tier` succeeded
    pub failures: Vec<TierFailure>,
}

/// Every provider failed; the caller decides on the static fallback
#[derive(Debug, Clone, Default)]
pub struct ChainExhausted {
    pub failures: Vec<TierFailure>,
}

impl ChainExhausted {
    /// "gemini: rate limited: ...; openai: API key not configured"
    pub fn summary(&self) -> Option<String> {
        summarize(&self.failures)
    }
}

pub(crate) fn summarize(failures: &[TierFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }
    Some(
        failures
            .iter()
            .map(|f| format!("{}: {}", f.tier, f.error))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

struct ProviderSlot {
    provider: Arc<dyn AiProvider>,
    cooling_until: Mutex<Option<Instant>>,
}

impl ProviderSlot {
    fn is_cooling(&self, now: Instant) -> bool {
        let guard = self
            .cooling_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.is_some_and(|until| now < until)
    }

    fn start_cooldown(&self, until: Instant) {
        let mut guard = self
            .cooling_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(until);
    }
}

/// Ordered list of AI providers tried until one yields parseable output
///
/// Each attempt is bounded by `timeout`. Transient failures are retried up to
/// `max_retries` times with linear backoff. A rate-limited provider is skipped
/// for `cooldown` across all requests sharing this chain.
pub struct ProviderChain {
    slots: Vec<ProviderSlot>,
    timeout: Duration,
    max_retries: u32,
    cooldown: Duration,
    retry_backoff: Duration,
}

impl ProviderChain {
    pub fn new(
        providers: Vec<Arc<dyn AiProvider>>,
        timeout: Duration,
        max_retries: u32,
        cooldown: Duration,
    ) -> Self {
        Self {
            slots: providers
                .into_iter()
                .map(|provider| ProviderSlot {
                    provider,
                    cooling_until: Mutex::new(None),
                })
                .collect(),
            timeout,
            max_retries,
            cooldown,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }

    /// Gemini, OpenAI, Hugging Face, Cohere, sharing one HTTP client
    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        let providers: Vec<Arc<dyn AiProvider>> = vec![
            Arc::new(GeminiProvider::new(
                http_client.clone(),
                config.gemini_api_key.clone(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            )),
            Arc::new(OpenAiProvider::new(
                http_client.clone(),
                config.openai_api_key.clone(),
                config.openai_api_url.clone(),
                config.openai_model.clone(),
            )),
            Arc::new(HuggingFaceProvider::new(
                http_client.clone(),
                config.huggingface_api_key.clone(),
                config.huggingface_api_url.clone(),
                config.huggingface_model.clone(),
            )),
            Arc::new(CohereProvider::new(
                http_client,
                config.cohere_api_key.clone(),
                config.cohere_api_url.clone(),
                config.cohere_model.clone(),
            )),
        ];

        Self::new(
            providers,
            config.ai_timeout(),
            config.ai_max_retries,
            config.ai_cooldown(),
        )
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.slots.iter().map(|slot| slot.provider.tier()).collect()
    }

    /// Runs `prompt` through each provider until `parse` accepts an answer
    pub async fn run<T, F>(&self, prompt: &str, parse: F) -> Result<ChainOutcome<T>, ChainExhausted>
    where
        F: Fn(&str) -> Option<T>,
    {
        let mut failures = Vec::new();

        for slot in &self.slots {
            let tier = slot.provider.tier();

            if slot.is_cooling(Instant::now()) {
                tracing::debug!(tier = %tier, "Skipping provider in cooldown");
                failures.push(TierFailure {
                    tier,
                    error: ProviderError::CoolingDown,
                });
                continue;
            }

            match self.attempt(slot, prompt, &parse).await {
                Ok(value) => {
                    tracing::info!(
                        tier = %tier,
                        failed_tiers = failures.len(),
                        "AI provider produced a usable answer"
                    );
                    return Ok(ChainOutcome {
                        value,
                        tier,
                        failures,
                    });
                }
                Err(error) => {
                    if error == ProviderError::MissingApiKey {
                        tracing::debug!(tier = %tier, "Provider not configured");
                    } else {
                        tracing::warn!(tier = %tier, error = %error, "AI provider failed, trying next tier");
                    }
                    failures.push(TierFailure { tier, error });
                }
            }
        }

        Err(ChainExhausted { failures })
    }

    /// Runs one provider, with retries for transient failures
    async fn attempt<T, F>(&self, slot: &ProviderSlot, prompt: &str, parse: &F) -> Result<T, ProviderError>
    where
        F: Fn(&str) -> Option<T>,
    {
        let mut retries = 0;

        loop {
            let result = match tokio::time::timeout(self.timeout, slot.provider.complete(prompt)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.timeout)),
            };

            let error = match result {
                Ok(text) => {
                    return parse(&text).ok_or_else(|| ProviderError::Unparseable(truncate(&text, 120)));
                }
                Err(error) => error,
            };

            if let ProviderError::RateLimited(_) = error {
                slot.start_cooldown(Instant::now() + self.cooldown);
                return Err(error);
            }

            if error.is_transient() && retries < self.max_retries {
                retries += 1;
                tracing::debug!(
                    tier = %slot.provider.tier(),
                    retry = retries,
                    error = %error,
                    "Retrying AI provider"
                );
                tokio::time::sleep(self.retry_backoff * retries).await;
                continue;
            }

            return Err(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ai::MockAiProvider;

    fn mock(tier: Tier, reply: Result<&'static str, ProviderError>) -> MockAiProvider {
        let mut provider = MockAiProvider::new();
        provider.expect_tier().return_const(tier);
        provider
            .expect_complete()
            .returning(move |_| reply.clone().map(str::to_string));
        provider
    }

    fn chain(providers: Vec<MockAiProvider>, max_retries: u32) -> ProviderChain {
        let providers = providers
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn AiProvider>)
            .collect();
        ProviderChain::new(providers, Duration::from_secs(5), max_retries, Duration::from_secs(60))
            .with_retry_backoff(Duration::from_millis(1))
    }

    fn parse_number(text: &str) -> Option<u32> {
        text.trim().parse().ok()
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let chain = chain(
            vec![mock(Tier::Gemini, Ok("7")), mock(Tier::OpenAi, Ok("9"))],
            0,
        );
        let outcome = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(outcome.value, 7);
        assert_eq!(outcome.tier, Tier::Gemini);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_falls_through_failures_in_order() {
        let chain = chain(
            vec![
                mock(Tier::Gemini, Err(ProviderError::MissingApiKey)),
                mock(Tier::OpenAi, Ok("not a number")),
                mock(Tier::HuggingFace, Ok("3")),
            ],
            0,
        );
        let outcome = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(outcome.tier, Tier::HuggingFace);
        assert_eq!(outcome.value, 3);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].error, ProviderError::MissingApiKey);
        assert!(matches!(outcome.failures[1].error, ProviderError::Unparseable(_)));
    }

    #[tokio::test]
    async fn test_exhausted_reports_every_tier() {
        let chain = chain(
            vec![
                mock(Tier::Gemini, Err(ProviderError::MissingApiKey)),
                mock(Tier::Cohere, Err(ProviderError::Malformed("bad".to_string()))),
            ],
            0,
        );
        let exhausted = chain.run("prompt", parse_number).await.unwrap_err();
        assert_eq!(exhausted.failures.len(), 2);
        let summary = exhausted.summary().unwrap();
        assert!(summary.starts_with("gemini: API key not configured"));
        assert!(summary.contains("cohere: malformed response"));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let mut provider = MockAiProvider::new();
        provider.expect_tier().return_const(Tier::Gemini);
        let mut calls = 0;
        provider.expect_complete().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ProviderError::Status {
                    status: 503,
                    body: "overloaded".to_string(),
                })
            } else {
                Ok("5".to_string())
            }
        });

        let chain = chain(vec![provider], 1);
        let outcome = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(outcome.value, 5);
        assert_eq!(outcome.tier, Tier::Gemini);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut provider = MockAiProvider::new();
        provider.expect_tier().return_const(Tier::Gemini);
        provider.expect_complete().times(1).returning(|_| {
            Err(ProviderError::Status {
                status: 400,
                body: "bad request".to_string(),
            })
        });

        let chain = chain(vec![provider], 3);
        assert!(chain.run("prompt", parse_number).await.is_err());
    }

    #[tokio::test]
    async fn test_rate_limited_provider_cools_down() {
        let mut limited = MockAiProvider::new();
        limited.expect_tier().return_const(Tier::Gemini);
        limited
            .expect_complete()
            .times(1)
            .returning(|_| Err(ProviderError::RateLimited("quota".to_string())));

        let chain = chain(vec![limited, mock(Tier::OpenAi, Ok("1"))], 0);

        let first = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(first.tier, Tier::OpenAi);
        assert!(matches!(first.failures[0].error, ProviderError::RateLimited(_)));

        // Gemini is not called again while cooling down
        let second = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(second.tier, Tier::OpenAi);
        assert_eq!(second.failures[0].error, ProviderError::CoolingDown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_is_tried_again_after_cooldown() {
        let mut limited = MockAiProvider::new();
        limited.expect_tier().return_const(Tier::Gemini);
        let mut calls = 0;
        limited.expect_complete().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(ProviderError::RateLimited("quota".to_string()))
            } else {
                Ok("4".to_string())
            }
        });

        let chain = chain(vec![limited, mock(Tier::OpenAi, Ok("1"))], 0);

        let first = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(first.tier, Tier::OpenAi);

        tokio::time::advance(Duration::from_secs(30)).await;
        let cooling = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(cooling.failures[0].error, ProviderError::CoolingDown);

        tokio::time::advance(Duration::from_secs(31)).await;
        let recovered = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(recovered.tier, Tier::Gemini);
        assert_eq!(recovered.value, 4);
        assert!(recovered.failures.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out() {
        struct Slow;

        #[async_trait::async_trait]
        impl AiProvider for Slow {
            fn tier(&self) -> Tier {
                Tier::Gemini
            }

            async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("1".to_string())
            }
        }

        let providers: Vec<Arc<dyn AiProvider>> =
            vec![Arc::new(Slow), Arc::new(mock(Tier::Cohere, Ok("2")))];
        let chain = ProviderChain::new(
            providers,
            Duration::from_secs(1),
            0,
            Duration::from_secs(60),
        );

        let outcome = chain.run("prompt", parse_number).await.unwrap();
        assert_eq!(outcome.tier, Tier::Cohere);
        assert_eq!(
            outcome.failures[0].error,
            ProviderError::Timeout(Duration::from_secs(1))
        );
    }

    #[test]
    fn test_from_config_orders_tiers() {
        let chain = ProviderChain::from_config(&Config::default(), reqwest::Client::new());
        assert_eq!(
            chain.tiers(),
            vec![Tier::Gemini, Tier::OpenAi, Tier::HuggingFace, Tier::Cohere]
        );
    }
}
