//! Client for the `wall.get` listing endpoint.

pub mod models;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::{PAGE_SIZE, USER_AGENT};
pub use models::{PostId, RawPost, WallGetResponse};

/// API error code for "too many requests per second".
const API_RATE_LIMITED: i64 = 6;
/// API error code for "internal server error".
const API_INTERNAL_ERROR: i64 = 10;

/// Why a single page could not be retrieved.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl PageError {
    /// Whether another attempt at the same page may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Api { code, .. } => matches!(*code, API_RATE_LIMITED | API_INTERNAL_ERROR),
            Self::Decode(_) => false,
        }
    }
}

/// HTTP client bound to one API endpoint, token and version.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    access_token: String,
    version: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ApiClient {
    /// Create a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.api_token.clone(),
            version: config.api_version.clone(),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff,
        })
    }

    /// Fetch one page of up to [`PAGE_SIZE`] posts starting at `offset`.
    ///
    /// Transient failures are retried with exponential backoff up to the
    /// configured number of retries.
    ///
    /// # Errors
    ///
    /// Returns the last error once retries are spent, or immediately for
    /// permanent failures.
    pub async fn wall_page(&self, owner_id: i64, offset: u64) -> Result<Vec<RawPost>, PageError> {
        let mut attempt = 0u32;
        loop {
            match self.request_page(owner_id, offset).await {
                Ok(items) => return Ok(items),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self
                        .retry_backoff
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    warn!(
                        owner_id,
                        offset,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient page failure, retrying: {e}"
                    );
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_page(&self, owner_id: i64, offset: u64) -> Result<Vec<RawPost>, PageError> {
        let url = format!("{}/wall.get", self.base_url);
        debug!(owner_id, offset, "Requesting wall page");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("owner_id", owner_id.to_string()),
                ("count", PAGE_SIZE.to_string()),
                ("offset", offset.to_string()),
                ("access_token", self.access_token.clone()),
                ("v", self.version.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PageError::Status(status));
        }

        let body = response.bytes().await?;
        let reply: WallGetResponse = serde_json::from_slice(&body)?;

        if let Some(error) = reply.error {
            return Err(PageError::Api {
                code: error.error_code,
                message: error.error_msg,
            });
        }

        Ok(reply.response.map(|r| r.items).unwrap_or_default())
    }
}
