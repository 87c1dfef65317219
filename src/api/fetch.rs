//! HTTP fetching with bounded retry.
//!
//! All remote reads go through [`Fetcher::fetch`]. Transport failures are
//! classified and retried with backoff; any HTTP response, whatever its
//! status, is handed back to the caller untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

use super::TOKEN_PARAM;
use crate::retry::{self, RetryAction, RetryConfig};

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Transport failures, classified so the retry loop can tell a dead host from
/// a request that can never succeed.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Timed out requesting {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Invalid request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidRequest { .. })
    }

    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = redact_token(url);
        let reason = err.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if err.is_connect() {
            FetchError::Connect { url, reason }
        } else if err.is_builder() {
            FetchError::InvalidRequest { url, reason }
        } else {
            FetchError::Transport { url, reason }
        }
    }
}

/// Transport boundary for every remote read.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// Real transport backed by reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("thingsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Issues GET requests through a transport and retries transport failures.
pub struct Fetcher {
    transport: Box<dyn HttpTransport>,
    retry: RetryConfig,
}

impl Fetcher {
    pub fn new(transport: Box<dyn HttpTransport>, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }

    /// GET `url`, returning the response or `None` once the retry budget is
    /// spent. Non-2xx responses are returned as-is.
    pub async fn fetch(&self, url: &str) -> Option<HttpResponse> {
        let result = retry::retry_with_backoff(
            &self.retry,
            |e: &FetchError| {
                if e.is_retryable() {
                    RetryAction::Retry
                } else {
                    RetryAction::Abort
                }
            },
            || self.transport.get(url),
        )
        .await;

        match result {
            Ok(resp) => Some(resp),
            Err(e) => {
                tracing::error!("Giving up on {}: {}", redact_token(url), e);
                None
            }
        }
    }
}

/// Replace the access token in a URL so it can be logged.
pub fn redact_token(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !parsed.query_pairs().any(|(k, _)| k == TOKEN_PARAM) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == TOKEN_PARAM {
                "REDACTED".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;

    fn retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay_secs: 0,
            max_delay_secs: 0,
        }
    }

    #[tokio::test]
    async fn test_always_failing_endpoint_exhausts_budget() {
        let mock = MockTransport::new();
        let fetcher = Fetcher::new(Box::new(mock.clone()), retry(3));
        let url = "https://api.test/things/1/?access_token=tok";

        assert!(fetcher.fetch(url).await.is_none());
        assert_eq!(mock.request_count(url), 3);
    }

    #[tokio::test]
    async fn test_non_success_status_is_returned() {
        let mock = MockTransport::new();
        let url = "https://api.test/things/1/?access_token=tok";
        mock.push_status(url, 404);
        let fetcher = Fetcher::new(Box::new(mock.clone()), retry(5));

        let resp = fetcher.fetch(url).await.unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
        assert_eq!(mock.request_count(url), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let mock = MockTransport::new();
        let url = "https://api.test/things/1/?access_token=tok";
        mock.push_error(
            url,
            FetchError::Timeout {
                url: url.to_string(),
            },
        );
        mock.push_error(
            url,
            FetchError::Connect {
                url: url.to_string(),
                reason: "dns".to_string(),
            },
        );
        mock.push_body(url, b"ok".to_vec());
        let fetcher = Fetcher::new(Box::new(mock.clone()), retry(5));

        let resp = fetcher.fetch(url).await.unwrap();
        assert_eq!(resp.body, b"ok");
        assert_eq!(mock.request_count(url), 3);
    }

    #[tokio::test]
    async fn test_invalid_request_is_not_retried() {
        let mock = MockTransport::new();
        let url = "https://api.test/things/1/";
        mock.push_error(
            url,
            FetchError::InvalidRequest {
                url: url.to_string(),
                reason: "bad".to_string(),
            },
        );
        let fetcher = Fetcher::new(Box::new(mock.clone()), retry(5));

        assert!(fetcher.fetch(url).await.is_none());
        assert_eq!(mock.request_count(url), 1);
    }

    #[test]
    fn test_error_classification() {
        let url = "x".to_string();
        assert!(FetchError::Timeout { url: url.clone() }.is_retryable());
        assert!(FetchError::Connect {
            url: url.clone(),
            reason: String::new()
        }
        .is_retryable());
        assert!(FetchError::Transport {
            url: url.clone(),
            reason: String::new()
        }
        .is_retryable());
        assert!(!FetchError::InvalidRequest {
            url,
            reason: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_redact_token() {
        assert_eq!(
            redact_token("https://api.test/things/1/?access_token=secret&page=2"),
            "https://api.test/things/1/?access_token=REDACTED&page=2"
        );
        assert_eq!(
            redact_token("https://cdn.test/img.jpg"),
            "https://cdn.test/img.jpg"
        );
        assert_eq!(redact_token("not a url"), "not a url");
    }
}
