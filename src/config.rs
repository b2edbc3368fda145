use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. The in-memory store is used when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL for metadata caching. Caching is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    // AI providers, tried in this order
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default)]
    pub huggingface_api_key: Option<String>,
    #[serde(default = "default_huggingface_api_url")]
    pub huggingface_api_url: String,
    #[serde(default = "default_huggingface_model")]
    pub huggingface_model: String,

    #[serde(default)]
    pub cohere_api_key: Option<String>,
    #[serde(default = "default_cohere_api_url")]
    pub cohere_api_url: String,
    #[serde(default = "default_cohere_model")]
    pub cohere_model: String,

    /// Per-attempt timeout for AI provider calls, in seconds
    #[serde(default = "default_ai_timeout_secs")]
    pub ai_timeout_secs: u64,

    /// Retries per provider for transient failures (timeouts, 5xx, transport)
    #[serde(default = "default_ai_max_retries")]
    pub ai_max_retries: u32,

    /// How long a rate-limited provider is skipped, in seconds
    #[serde(default = "default_ai_cooldown_secs")]
    pub ai_cooldown_secs: u64,

    // Movie metadata
    #[serde(default)]
    pub tmdb_api_key: Option<String>,
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    #[serde(default)]
    pub omdb_api_key: Option<String>,
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Maximum concurrent metadata lookups per request
    #[serde(default = "default_metadata_concurrency")]
    pub metadata_concurrency: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_huggingface_api_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_huggingface_model() -> String {
    "mistralai/Mistral-7B-Instruct-v0.2".to_string()
}

fn default_cohere_api_url() -> String {
    "https://api.cohere.ai".to_string()
}

fn default_cohere_model() -> String {
    "command-r".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    20
}

fn default_ai_max_retries() -> u32 {
    1
}

fn default_ai_cooldown_secs() -> u64 {
    60
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_omdb_api_url() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_metadata_concurrency() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            redis_url: None,
            host: default_host(),
            port: default_port(),
            gemini_api_key: None,
            gemini_api_url: default_gemini_api_url(),
            gemini_model: default_gemini_model(),
            openai_api_key: None,
            openai_api_url: default_openai_api_url(),
            openai_model: default_openai_model(),
            huggingface_api_key: None,
            huggingface_api_url: default_huggingface_api_url(),
            huggingface_model: default_huggingface_model(),
            cohere_api_key: None,
            cohere_api_url: default_cohere_api_url(),
            cohere_model: default_cohere_model(),
            ai_timeout_secs: default_ai_timeout_secs(),
            ai_max_retries: default_ai_max_retries(),
            ai_cooldown_secs: default_ai_cooldown_secs(),
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            omdb_api_key: None,
            omdb_api_url: default_omdb_api_url(),
            metadata_concurrency: default_metadata_concurrency(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.ai_timeout_secs == 0 {
            anyhow::bail!("AI_TIMEOUT_SECS must be greater than zero");
        }
        if self.metadata_concurrency == 0 {
            anyhow::bail!("METADATA_CONCURRENCY must be greater than zero");
        }
        Ok(())
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn ai_cooldown(&self) -> Duration {
        Duration::from_secs(self.ai_cooldown_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
