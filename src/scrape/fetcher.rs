//! HTTP fetcher implementation
//!
//! This module handles the page fetch of the scrape phase:
//! - Building the long-lived HTTP client shared across requests
//! - GET requests bounded by a per-request timeout
//! - Error classification into timeout and network failures

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Maximum redirect hops followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Errors raised while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    /// The fetch did not complete within its timeout
    #[error("Scraping timed out ({secs}s) for {url}")]
    Timeout { url: String, secs: u64 },

    /// Connection, DNS, TLS or HTTP status failure
    #[error("Network or HTTP error for {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// Returns true for the timeout variant
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Builds the HTTP client used for page fetches
///
/// The client is built once and reused across requests so its connection
/// pool is shared.
///
/// # Example
///
/// ```no_run
/// use scrape_dispatch::config::UserAgentConfig;
/// use scrape_dispatch::scrape::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and returns its body as text
///
/// # Error Mapping
///
/// | Condition | Result |
/// |-----------|--------|
/// | Request or body read exceeds `timeout` | `FetchError::Timeout` |
/// | HTTP status >= 400 | `FetchError::Network` |
/// | Connection refused, DNS, TLS | `FetchError::Network` |
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `url` - The URL to fetch
/// * `timeout` - Upper bound on the whole exchange, body included
pub async fn fetch_page(client: &Client, url: &str, timeout: Duration) -> Result<String, FetchError> {
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                secs: timeout.as_secs(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    };

    let exchange = async {
        let response = client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Network {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        response.text().await.map_err(classify)
    };

    // Outer bound on the whole exchange, body included
    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}
