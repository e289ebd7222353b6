use serde::{Deserialize, Serialize};

/// Configuration for the API-Football client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the vendor API
    pub base_url: String,

    /// Subscription key sent in the `x-rapidapi-key` header
    pub api_key: String,

    /// Host value sent in the `x-rapidapi-host` header
    pub api_host: String,

    /// Minimum spacing between consecutive requests, in milliseconds
    pub rate_limit_ms: u64,

    /// Attempts per logical call (first try included)
    pub max_attempts: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://v3.football.api-sports.io".to_string(),
            api_key: String::new(),
            api_host: "v3.football.api-sports.io".to_string(),
            rate_limit_ms: 150,
            max_attempts: 3,
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("APIFOOTBALL_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(key) = std::env::var("APIFOOTBALL_KEY") {
            config.api_key = key;
        }
        if let Ok(host) = std::env::var("APIFOOTBALL_HOST") {
            config.api_host = host;
        }
        if let Ok(delay) = std::env::var("APIFOOTBALL_RATE_LIMIT_MS") {
            config.rate_limit_ms = delay.parse().unwrap_or(config.rate_limit_ms);
        }

        config
    }
}
