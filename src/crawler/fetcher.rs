//! HTTP asset fetcher
//!
//! This module handles every download the harvester makes, listing pages and
//! product images alike:
//! - Building the HTTP client with user agent, timeout and optional proxy
//! - Bounded retry with exponential backoff for transient failures
//! - Error classification
//!
//! There is no caching at this layer.

use crate::config::FetcherConfig;
use crate::NetworkError;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
/// * `proxy` - Optional proxy URL applied to both http and https requests
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Invalid proxy or client setup failure
pub fn build_http_client(config: &FetcherConfig, proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_millis(config.timeout_ms))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder.proxy(Proxy::all(proxy)?);
    }

    builder.build()
}

/// Downloads raw bytes with bounded retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Return body |
/// | HTTP 5xx | Retry until `max-attempts` is reached |
/// | Timeout / connection failure | Retry until `max-attempts` is reached |
/// | HTTP 4xx and anything else | Fail immediately |
///
/// The wait before retry `n` is `initial-backoff-ms * backoff-factor^(n-1)`.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: Client,
    max_attempts: u32,
    initial_backoff: Duration,
    backoff_factor: u32,
}

impl AssetFetcher {
    pub fn new(config: &FetcherConfig, proxy: Option<&str>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config, proxy)?,
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            backoff_factor: config.backoff_factor.max(1),
        })
    }

    /// Fetches `url` and returns the response body
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.retry_delay(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Wait before retry number `retry` (1-based)
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let multiplier = self
            .backoff_factor
            .checked_pow(retry.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(multiplier)
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| NetworkError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| NetworkError::Transport {
                url: url.to_string(),
                source,
            })?;

        tracing::trace!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }
}
