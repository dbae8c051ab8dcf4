use std::time::Duration;

use thiserror::Error;

use crate::constants::PAGE_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Remote API
    pub api_url: String,
    pub api_token: String,
    pub api_version: String,
    pub request_timeout: Duration,

    // Fetcher
    pub fetch_concurrency: usize,
    pub batch_width: u64,
    pub max_retries: u32,
    pub retry_backoff: Duration,

    // Wall cache
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Remote API
            api_url: env_or_default("VK_API_URL", "https://api.vk.com/method"),
            api_token: required_env("VK_API_TOKEN")?,
            api_version: env_or_default("VK_API_VERSION", "5.131"),
            request_timeout: Duration::from_secs(parse_env_u64("REQUEST_TIMEOUT_SECS", 30)?),

            // Fetcher
            fetch_concurrency: parse_env_usize("FETCH_CONCURRENCY", 36)?,
            batch_width: parse_env_u64("FETCH_BATCH_WIDTH", 3500)?,
            max_retries: parse_env_u32("FETCH_MAX_RETRIES", 2)?,
            retry_backoff: Duration::from_millis(parse_env_u64("FETCH_RETRY_BACKOFF_MS", 500)?),

            // Wall cache
            cache_ttl: Duration::from_secs(parse_env_u64("WALL_CACHE_TTL_SECS", 300)?),
            cache_capacity: parse_env_usize("WALL_CACHE_CAPACITY", 128)?,
        })
    }

    /// Configuration pointing at `api_url` with no retries and short timeouts.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            api_url: "http://127.0.0.1:9/method".to_string(),
            api_token: "test-token".to_string(),
            api_version: "5.131".to_string(),
            request_timeout: Duration::from_secs(5),
            fetch_concurrency: 4,
            batch_width: 3500,
            max_retries: 0,
            retry_backoff: Duration::from_millis(10),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 128,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "VK_API_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if let Err(e) = url::Url::parse(&self.api_url) {
            return Err(ConfigError::InvalidValue {
                name: "VK_API_URL".to_string(),
                message: e.to_string(),
            });
        }
        if self.fetch_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                name: "FETCH_CONCURRENCY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.batch_width < PAGE_SIZE || self.batch_width % PAGE_SIZE != 0 {
            return Err(ConfigError::InvalidValue {
                name: "FETCH_BATCH_WIDTH".to_string(),
                message: format!("must be a positive multiple of {PAGE_SIZE}"),
            });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "WALL_CACHE_CAPACITY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
