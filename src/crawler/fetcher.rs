//! HTTP fetcher implementation
//!
//! This module defines the fetch client seam the crawler drives, plus the
//! default reqwest-backed implementation:
//! - Building HTTP clients with the configured user agent and timeout
//! - Single GET requests with per-request headers and timeout
//! - Error classification (timeout, network, HTTP status, body read)
//!
//! No retries happen here; a failed fetch is reported once and the caller
//! decides what to do with it.

use crate::config::CrawlerConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect::Policy, Client};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code of the final response
    pub status_code: u16,
    /// Final URL after redirects
    pub final_url: String,
    /// Response body decoded as text
    pub body: String,
    /// Response headers (repeated headers joined with ", ")
    pub headers: BTreeMap<String, String>,
}

/// Reasons a single fetch can fail
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// The URL the failed request was made for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Network { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::Body { url, .. } => url,
        }
    }
}

/// Performs single HTTP GET requests on behalf of the crawler
pub trait FetchClient: Send + Sync {
    /// Fetches `url` once, sending `headers`, giving up after `timeout`
    fn fetch(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are followed (up to reqwest's default of 10 hops); the final URL
/// is reported in [`FetchResponse::final_url`].
///
/// # Example
///
/// ```no_run
/// use ripple_pipeline::config::CrawlerConfig;
/// use ripple_pipeline::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout_duration())
        .connect_timeout(Duration::from_secs(10).min(config.timeout_duration()))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetch client backed by a shared reqwest [`Client`]
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Builds a fetcher from crawler configuration
    pub fn new(config: &CrawlerConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl FetchClient for ReqwestFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .headers(to_header_map(headers))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let headers = collect_headers(response.headers());

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                classify_error(url, timeout, e)
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(FetchResponse {
            status_code: status.as_u16(),
            final_url,
            body,
            headers,
        })
    }
}

/// Classifies a reqwest error into a [`FetchError`]
fn classify_error(url: &str, timeout: Duration, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            seconds: timeout.as_secs(),
        }
    } else if e.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: format!("Connection failed: {}", e),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Converts configured headers into a reqwest header map
///
/// Invalid names or values are dropped; configuration validation rejects
/// them before a crawl starts.
fn to_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::debug!("Dropping invalid request header {}", name),
        }
    }
    map
}

/// Flattens response headers into a name -> value map
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&CrawlerConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_header_map_drops_invalid_entries() {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_string(), "text/html".to_string());
        headers.insert("Bad Name".to_string(), "x".to_string());

        let map = to_header_map(&headers);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("accept").unwrap(), "text/html");
    }

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", HeaderValue::from_static("a=1"));
        map.append("set-cookie", HeaderValue::from_static("b=2"));
        map.insert("content-type", HeaderValue::from_static("text/html"));

        let headers = collect_headers(&map);
        assert_eq!(headers["set-cookie"], "a=1, b=2");
        assert_eq!(headers["content-type"], "text/html");
    }

    #[test]
    fn test_fetch_error_url() {
        let err = FetchError::HttpStatus {
            url: "https://example.com/missing".to_string(),
            status: 404,
        };
        assert_eq!(err.url(), "https://example.com/missing");
        assert_eq!(err.to_string(), "HTTP 404 for https://example.com/missing");
    }
}
