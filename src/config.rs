//! Service configuration
//!
//! Values only; the mechanism that supplies them (env vars here, anything
//! upstream) is owned by the surrounding application. Malformed backend
//! credentials leave that backend unconfigured rather than failing startup.

use std::time::Duration;

/// Configuration for one remote generation backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API key; `None` means the backend is not configured
    pub api_key: Option<String>,

    /// Chat completions base URL
    pub base_url: String,

    /// Model identifier sent with each request
    pub model: String,

    /// Sliding-window admission ceiling (requests per minute)
    pub max_per_minute: usize,

    /// Per-request generation timeout
    pub request_timeout: Duration,

    /// Health probe timeout
    pub probe_timeout: Duration,
}

impl BackendConfig {
    /// Whether this backend can be attempted at all
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Full configuration surface for the review service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Premium backend (first chain stage)
    pub premium: BackendConfig,

    /// High-throughput backend (second chain stage)
    pub high_throughput: BackendConfig,

    /// Generation cache time-to-live
    pub cache_ttl: Duration,

    /// Generation cache capacity ceiling
    pub cache_capacity: usize,

    /// Bulk eviction trims the cache down to this many entries
    pub cache_watermark: usize,

    /// Minimum qualifying past-performance contract value
    pub min_contract_value: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            premium: BackendConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-3.5-turbo".to_string(),
                max_per_minute: 50,
                request_timeout: Duration::from_secs(30),
                probe_timeout: Duration::from_secs(5),
            },
            high_throughput: BackendConfig {
                api_key: None,
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "llama3-8b-8192".to_string(),
                max_per_minute: 100,
                request_timeout: Duration::from_secs(30),
                probe_timeout: Duration::from_secs(5),
            },
            cache_ttl: Duration::from_secs(15 * 60),
            cache_capacity: 1000,
            cache_watermark: 900,
            min_contract_value: 25_000.0,
        }
    }
}

impl ServiceConfig {
    /// Create a new config builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// `OPENAI_API_KEY` / `GROQ_API_KEY` enable the remote backends; keys
    /// that fail the shape check are ignored and the backend stays
    /// unconfigured.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.premium.api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| validate_api_key(key, "openai"));
        config.high_throughput.api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|key| validate_api_key(key, "groq"));

        if let Some(url) = std::env::var("OPENAI_BASE_URL").ok().filter(|u| !u.is_empty()) {
            config.premium.base_url = url;
        }
        if let Some(url) = std::env::var("GROQ_BASE_URL").ok().filter(|u| !u.is_empty()) {
            config.high_throughput.base_url = url;
        }

        if let Some(limit) = parse_env("OPENAI_MAX_PER_MINUTE") {
            config.premium.max_per_minute = limit;
        }
        if let Some(limit) = parse_env("GROQ_MAX_PER_MINUTE") {
            config.high_throughput.max_per_minute = limit;
        }
        if let Some(secs) = parse_env("GENERATION_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(cap) = parse_env("GENERATION_CACHE_CAPACITY") {
            config.cache_capacity = cap;
            config.cache_watermark = cap - cap / 10;
        }
        if let Some(min) = parse_env::<f64>("MIN_CONTRACT_VALUE") {
            config.min_contract_value = min;
        }

        config
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Validate API key shape for a provider. Weeds out placeholder values
/// before any network traffic happens.
pub fn validate_api_key(api_key: &str, provider: &str) -> bool {
    match provider {
        "openai" => api_key.starts_with("sk-") && api_key.len() > 20,
        "groq" => api_key.starts_with("gsk_") && api_key.len() > 20,
        _ => false,
    }
}

/// Builder for ServiceConfig
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ServiceConfig::default(),
        }
    }

    /// Set the premium backend API key (no shape validation; callers that
    /// want it use [`validate_api_key`])
    pub fn premium_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.premium.api_key = Some(key.into());
        self
    }

    /// Set the premium backend base URL
    pub fn premium_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.premium.base_url = url.into();
        self
    }

    /// Set the high-throughput backend API key
    pub fn high_throughput_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.high_throughput.api_key = Some(key.into());
        self
    }

    /// Set the high-throughput backend base URL
    pub fn high_throughput_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.high_throughput.base_url = url.into();
        self
    }

    /// Set both backends' rate ceilings
    pub fn rate_limits(mut self, premium: usize, high_throughput: usize) -> Self {
        self.config.premium.max_per_minute = premium;
        self.config.high_throughput.max_per_minute = high_throughput;
        self
    }

    /// Set the cache time-to-live
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Set the cache capacity ceiling and eviction watermark
    pub fn cache_capacity(mut self, capacity: usize, watermark: usize) -> Self {
        self.config.cache_capacity = capacity;
        self.config.cache_watermark = watermark;
        self
    }

    /// Set the past-performance qualifying threshold
    pub fn min_contract_value(mut self, min: f64) -> Self {
        self.config.min_contract_value = min;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
