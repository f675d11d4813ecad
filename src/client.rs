//! Command-line test client for the front-end
//!
//! Sends one `GET /scrape` request and prints a short summary followed by
//! the full response body.

use crate::front::ScrapeResponse;
use crate::url::scrape_endpoint;
use crate::DispatchError;
use std::fmt::Write as _;
use std::time::Duration;

/// Default client timeout; covers the front-end's own fetch and processor waits
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(150);

/// Longest prefix of a non-JSON body that is echoed back
const RAW_BODY_LIMIT: usize = 1000;

/// Response as seen by the client
#[derive(Debug)]
pub struct ClientResponse {
    pub status: u16,
    pub body: String,
}

/// Issues `GET /scrape?url=<target>` against the front-end at `host:port`
pub async fn request_scrape(
    target: &str,
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<ClientResponse, DispatchError> {
    let endpoint = scrape_endpoint(host, port);
    tracing::info!("Sending request to {} for {}", endpoint, target);

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .get(&endpoint)
        .query(&[("url", target)])
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout {
                    stage: "waiting for scrape server response",
                    limit: timeout,
                }
            } else {
                DispatchError::Reqwest(e)
            }
        })?;

    let status = response.status().as_u16();
    let body = response.text().await?;

    Ok(ClientResponse { status, body })
}

/// Renders a response for the terminal
///
/// JSON bodies get a summary (status, title, processing error or screenshot
/// size) followed by the pretty-printed body. Anything else is echoed,
/// truncated.
pub fn render_response(response: &ClientResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "HTTP status: {}", response.status);

    let value: serde_json::Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) => {
            let raw: String = response.body.chars().take(RAW_BODY_LIMIT).collect();
            let _ = writeln!(out, "Response is not JSON:");
            let _ = writeln!(out, "{}", raw);
            return out;
        }
    };

    let status = value["status"].as_str().unwrap_or("unknown");
    let _ = writeln!(out, "Status: {}", status);

    match serde_json::from_value::<ScrapeResponse>(value.clone()) {
        Ok(ScrapeResponse::Record(record)) => {
            let _ = writeln!(out, "Title: {}", record.scraping_data.title);
            match record.processing_data.error() {
                Some(error) => {
                    let _ = writeln!(out, "Processing error: {}", error);
                }
                None => {
                    let size = record
                        .processing_data
                        .report()
                        .map(|r| r.screenshot.len())
                        .unwrap_or(0);
                    let _ = writeln!(out, "Screenshot: {} base64 chars", size);
                }
            }
        }
        Ok(ScrapeResponse::Error(error)) => {
            let _ = writeln!(out, "Error: {}", error.message);
        }
        Err(e) => {
            tracing::debug!("Response did not match a scrape record: {}", e);
        }
    }

    let pretty = serde_json::to_string_pretty(&value).unwrap_or_else(|_| response.body.clone());
    let _ = writeln!(out, "\n{}", pretty);
    out
}
