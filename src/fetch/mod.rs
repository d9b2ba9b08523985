//! Rate-limit-aware HTTP client for the upstream ranked API.
//!
//! Performs one logical request and classifies the outcome. HTTP 429 is
//! never surfaced as a generic error: it becomes [`FetchError::RateLimited`]
//! carrying the upstream-advertised delay (falling back to the configured
//! default, one second, when the `Retry-After` header is absent or
//! unparsable). The client performs no retries; backoff policy belongs
//! to callers, where it composes with the concurrency limiter.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Header carrying the upstream API key.
const API_KEY_HEADER: &str = "X-Riot-Token";

/// Errors (and non-success outcomes) of a fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("not found upstream")]
    NotFound,

    #[error("upstream returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("response body error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Successful response.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub status: u16,
    pub body: String,
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Upstream API key, sent on every request.
    pub api_key: String,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Fallback delay when a 429 carries no usable Retry-After header.
    pub retry_after_default_secs: u64,

    /// User agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            timeout: Duration::from_secs(10),
            retry_after_default_secs: 1,
            user_agent: format!("ladder-tracker/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client wrapper that classifies upstream outcomes.
///
/// Holds no mutable state; clone freely across tasks.
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("ladder-tracker/0.1.0")),
        );

        if !config.api_key.is_empty() {
            match HeaderValue::from_str(&config.api_key) {
                Ok(value) => {
                    headers.insert(API_KEY_HEADER, value);
                }
                Err(_) => warn!("API key contains invalid header characters; sending without it"),
            }
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a client with default configuration (no API key).
    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(FetchConfig::default())
    }

    /// Issue one GET and classify the result.
    pub async fn fetch(&self, url: &Url) -> Result<FetchSuccess, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(err) = classify_status(
            status,
            retry_after.as_deref(),
            self.config.retry_after_default_secs,
        ) {
            return Err(err);
        }

        let body = response.text().await?;
        Ok(FetchSuccess { status, body })
    }

    /// Fetch and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let success = self.fetch(url).await?;
        Ok(serde_json::from_str(&success.body)?)
    }
}

/// Map a status (plus Retry-After header, if any) onto the error taxonomy.
/// `None` means the response is a success and its body should be read.
fn classify_status(status: u16, retry_after: Option<&str>, default_secs: u64) -> Option<FetchError> {
    match status {
        429 => {
            let retry_after_secs = retry_after
                .and_then(|s| s.parse().ok())
                .unwrap_or(default_secs);
            Some(FetchError::RateLimited { retry_after_secs })
        }
        404 => Some(FetchError::NotFound),
        s if (200..300).contains(&s) => None,
        s => Some(FetchError::Upstream { status: s }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_with_retry_after_header() {
        let err = classify_status(429, Some("3"), 1).unwrap();
        assert!(matches!(err, FetchError::RateLimited { retry_after_secs: 3 }));
    }

    #[test]
    fn test_429_without_header_uses_default() {
        let err = classify_status(429, None, 1).unwrap();
        assert!(matches!(err, FetchError::RateLimited { retry_after_secs: 1 }));
    }

    #[test]
    fn test_429_with_unparsable_header_uses_default() {
        // Retry-After may legally be an HTTP date, which we don't honor.
        let err = classify_status(429, Some("Wed, 21 Oct 2026 07:28:00 GMT"), 1).unwrap();
        assert!(matches!(err, FetchError::RateLimited { retry_after_secs: 1 }));
    }

    #[test]
    fn test_404_is_not_found() {
        assert!(matches!(
            classify_status(404, None, 1),
            Some(FetchError::NotFound)
        ));
    }

    #[test]
    fn test_other_failures_carry_status() {
        assert!(matches!(
            classify_status(503, None, 1),
            Some(FetchError::Upstream { status: 503 })
        ));
        assert!(matches!(
            classify_status(403, None, 1),
            Some(FetchError::Upstream { status: 403 })
        ));
    }

    #[test]
    fn test_success_statuses_pass_through() {
        assert!(classify_status(200, None, 1).is_none());
        assert!(classify_status(204, None, 1).is_none());
    }

    #[test]
    fn test_config_default_retry_after_is_one_second() {
        assert_eq!(FetchConfig::default().retry_after_default_secs, 1);
    }

    #[test]
    fn test_client_builds_with_defaults() {
        assert!(FetchClient::with_defaults().is_ok());
    }
}
