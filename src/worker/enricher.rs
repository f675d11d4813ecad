//! Page enrichment: screenshot, performance timing and thumbnails
//!
//! Enrichment is CPU and browser bound and runs on the worker pool's blocking
//! threads, so everything here is synchronous.

use crate::config::{EnricherConfig, UserAgentConfig};
use crate::protocol::{EnrichmentReport, Job, Performance};
use crate::worker::EnrichmentError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use reqwest::blocking::Client;
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Browser viewport used for screenshots
const WINDOW_SIZE: &str = "1280,720";

/// How often a running browser process is polled for exit
const BROWSER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Produces the enrichment report for a job
///
/// Implementations run on a blocking worker thread. A returned error, or a
/// panic, is reported to the caller as a failure result; neither affects other
/// jobs or the dispatcher.
pub trait Enricher: Send + Sync + 'static {
    fn enrich(&self, job: &Job) -> Result<EnrichmentReport, EnrichmentError>;
}

impl<F> Enricher for F
where
    F: Fn(&Job) -> Result<EnrichmentReport, EnrichmentError> + Send + Sync + 'static,
{
    fn enrich(&self, job: &Job) -> Result<EnrichmentReport, EnrichmentError> {
        self(job)
    }
}

/// Bytes and requests spent on a job's downloads
#[derive(Debug, Default, Clone, Copy)]
struct Transfer {
    requests: u32,
    bytes: u64,
}

/// Default enricher backed by a headless browser and an HTTP client
#[derive(Debug, Clone)]
pub struct PageEnricher {
    config: EnricherConfig,
    user_agent: String,
}

impl PageEnricher {
    /// Creates an enricher from its configuration
    pub fn new(config: EnricherConfig, user_agent: &UserAgentConfig) -> Self {
        Self {
            config,
            user_agent: user_agent.header_value(),
        }
    }

    fn http_client(&self, timeout: Duration) -> Result<Client, EnrichmentError> {
        Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentError::Other(format!("Failed to build HTTP client: {}", e)))
    }

    /// Loads the document and measures how long it took
    fn load_page(&self, client: &Client, url: &str) -> Result<(u64, Transfer), EnrichmentError> {
        let page_error = |message: String| EnrichmentError::PageLoad {
            url: url.to_string(),
            message,
        };

        let started = Instant::now();
        let response = client.get(url).send().map_err(|e| page_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(page_error(format!("HTTP {}", status)));
        }

        let body = response.bytes().map_err(|e| page_error(e.to_string()))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        Ok((
            elapsed_ms,
            Transfer {
                requests: 1,
                bytes: body.len() as u64,
            },
        ))
    }

    /// Captures a PNG screenshot with the configured headless browser
    ///
    /// The browser runs as a child process and is killed if it outlives the
    /// page-load timeout.
    fn capture_screenshot(&self, url: &str) -> Result<String, EnrichmentError> {
        let dir = tempfile::tempdir()
            .map_err(|e| EnrichmentError::Other(format!("Failed to create temp dir: {}", e)))?;
        let path = dir.path().join("screenshot.png");

        let mut child = Command::new(&self.config.browser)
            .args([
                "--headless",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--hide-scrollbars",
            ])
            .arg(format!("--window-size={}", WINDOW_SIZE))
            .arg(format!("--screenshot={}", path.display()))
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                EnrichmentError::Other(format!("Failed to start {}: {}", self.config.browser, e))
            })?;

        let deadline = Instant::now() + Duration::from_secs(self.config.page_load_timeout_secs);
        let status = loop {
            let polled = child
                .try_wait()
                .map_err(|e| EnrichmentError::Other(format!("Browser wait failed: {}", e)))?;

            match polled {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(EnrichmentError::Other(format!(
                        "Browser exceeded page load timeout ({}s)",
                        self.config.page_load_timeout_secs
                    )));
                }
                None => thread::sleep(BROWSER_POLL_INTERVAL),
            }
        };

        if !status.success() {
            return Err(EnrichmentError::Other(format!(
                "Browser exited with {}",
                status
            )));
        }

        read_base64(&path)
    }

    /// Downloads images and turns the usable ones into thumbnails
    ///
    /// Stops after `max_images` thumbnails. Non-HTTP(S) URLs are skipped without
    /// a request; failed downloads and undecodable images are skipped with a
    /// warning.
    fn generate_thumbnails(&self, image_urls: &[String]) -> (Vec<String>, Transfer) {
        let mut thumbnails = Vec::new();
        let mut transfer = Transfer::default();

        if self.config.max_images == 0 {
            return (thumbnails, transfer);
        }

        let client = match self.http_client(Duration::from_secs(self.config.image_timeout_secs)) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("Skipping thumbnails: {}", e);
                return (thumbnails, transfer);
            }
        };

        tracing::info!(
            "Processing {} image URLs (limit {})",
            image_urls.len(),
            self.config.max_images
        );

        for url in image_urls {
            if thumbnails.len() >= self.config.max_images {
                break;
            }

            if !url.starts_with("http://") && !url.starts_with("https://") {
                continue;
            }

            transfer.requests += 1;
            let response = match client.get(url).send() {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    tracing::warn!("Timeout downloading image: {}", url);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Failed to download {}: {}", url, e);
                    continue;
                }
            };

            let is_image = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .map_or(false, |ct| ct.contains("image"));

            if response.status() != reqwest::StatusCode::OK || !is_image {
                tracing::debug!("Skipping {}: status {}, image: {}", url, response.status(), is_image);
                continue;
            }

            let bytes = match response.bytes() {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("Failed to read image body {}: {}", url, e);
                    continue;
                }
            };
            transfer.bytes += bytes.len() as u64;

            match make_thumbnail(&bytes, self.config.thumbnail_size) {
                Ok(thumbnail) => thumbnails.push(thumbnail),
                Err(e) => tracing::warn!("Failed to process image {}: {}", url, e),
            }
        }

        tracing::info!("{} thumbnails generated", thumbnails.len());
        (thumbnails, transfer)
    }
}

impl Enricher for PageEnricher {
    fn enrich(&self, job: &Job) -> Result<EnrichmentReport, EnrichmentError> {
        tracing::info!("Starting enrichment for {}", job.url);

        let page_client =
            self.http_client(Duration::from_secs(self.config.page_load_timeout_secs))?;
        let (load_time_ms, page_transfer) = self.load_page(&page_client, &job.url)?;

        let screenshot = match self.capture_screenshot(&job.url) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!("Screenshot failed for {}: {}", job.url, e);
                String::new()
            }
        };

        let (thumbnails, image_transfer) = self.generate_thumbnails(&job.image_urls);

        let total_bytes = page_transfer.bytes + image_transfer.bytes;
        let performance = Performance {
            load_time_ms,
            total_size_kb: round_kb(total_bytes),
            num_requests: page_transfer.requests + image_transfer.requests,
        };

        tracing::info!("Enrichment completed for {}", job.url);

        Ok(EnrichmentReport {
            screenshot,
            performance,
            thumbnails,
        })
    }
}

/// Scales an image to fit a `size` x `size` square and returns it as base64 PNG
///
/// The aspect ratio is preserved.
pub fn make_thumbnail(bytes: &[u8], size: u32) -> Result<String, image::ImageError> {
    let thumbnail = image::load_from_memory(bytes)?.thumbnail(size, size);

    let mut png = Vec::new();
    thumbnail.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    Ok(STANDARD.encode(png))
}

fn read_base64(path: &Path) -> Result<String, EnrichmentError> {
    let bytes = std::fs::read(path)
        .map_err(|e| EnrichmentError::Other(format!("Screenshot not written: {}", e)))?;
    Ok(STANDARD.encode(bytes))
}

/// Converts bytes to KiB rounded to two decimals
fn round_kb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}
