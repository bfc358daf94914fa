use std::time::Duration;

use serde::Deserialize;

/// Longest accepted rate-limit window (one day)
pub const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 86_400;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Gemini API key. Without it the proxy answers 500 and the match
    /// endpoint stays on local keyword matching.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Gemini model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Base URL of a deployed recommendation proxy (`<url>/api/recommend`)
    #[serde(default)]
    pub recommend_endpoint: Option<String>,

    /// Upper bound on a single remote recommendation call
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Requests allowed per client within one window
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Fixed rate-limit window length
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Redis connection URL; selects the shared rate-limit backend when set
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Take client identity from CF-Connecting-IP / X-Forwarded-For / X-Real-IP
    #[serde(default)]
    pub trust_proxy_headers: bool,

    /// Catalog JSON file replacing the built-in catalog
    #[serde(default)]
    pub catalog_path: Option<String>,
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
    "gemini-2.0-flash".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_rate_limit_max_requests() -> u32 {
    10
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            gemini_api_key: None,
            gemini_api_url: default_gemini_api_url(),
            gemini_model: default_gemini_model(),
            recommend_endpoint: None,
            upstream_timeout_secs: default_upstream_timeout_secs(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            redis_url: None,
            trust_proxy_headers: false,
            catalog_path: None,
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

    /// Rejects values the rate limiter cannot represent
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_RATE_LIMIT_WINDOW_SECS).contains(&self.rate_limit_window_secs) {
            anyhow::bail!(
                "RATE_LIMIT_WINDOW_SECS must be between 1 and {}, got {}",
                MAX_RATE_LIMIT_WINDOW_SECS,
                self.rate_limit_window_secs
            );
        }
        Ok(())
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    /// Non-empty Gemini key, if any
    pub fn gemini_key(&self) -> Option<&str> {
        self.gemini_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
