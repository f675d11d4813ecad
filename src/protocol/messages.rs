//! Payloads carried inside frames
//!
//! A `Job` travels from the front-end to the dispatcher; an `EnrichmentResult`
//! travels back. The JSON shapes are fixed:
//!
//! - job: `{"url": ..., "image_urls": [...]}`
//! - success: `{"screenshot": ..., "performance": {...}, "thumbnails": [...]}`
//! - failure: `{"status": "error", "error": ...}`

use serde::{Deserialize, Serialize};

/// A unit of enrichment work for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// The page to enrich
    pub url: String,

    /// Absolute image URLs found on the page, in document order
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl Job {
    /// Creates a job for a page and its images
    pub fn new(url: impl Into<String>, image_urls: Vec<String>) -> Self {
        Self {
            url: url.into(),
            image_urls,
        }
    }
}

/// Page timing and transfer figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Time to load the document, in milliseconds
    pub load_time_ms: u64,

    /// Bytes transferred, in KiB rounded to two decimals
    pub total_size_kb: f64,

    /// Number of HTTP requests issued
    pub num_requests: u32,
}

/// The successful outcome of enriching a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentReport {
    /// Base64-encoded PNG screenshot, empty if capture failed
    pub screenshot: String,

    pub performance: Performance,

    /// Base64-encoded PNG thumbnails, in image order
    pub thumbnails: Vec<String>,
}

/// Marker serialized as `"status": "error"` on failure payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStatus {
    #[default]
    #[serde(rename = "error")]
    Error,
}

/// The failed outcome of enriching a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    #[serde(default)]
    pub status: FailureStatus,

    /// Human-readable description of what went wrong
    pub error: String,
}

/// Outcome of one job: a report or a failure, never both
///
/// Any object carrying an `error` field decodes as `Failure`, so a payload
/// that mixes report fields with an error is treated as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnrichmentResult {
    Failure(Failure),
    Success(EnrichmentReport),
}

impl EnrichmentResult {
    /// Builds a failure result from any displayable error
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(Failure {
            status: FailureStatus::Error,
            error: error.into(),
        })
    }

    /// Returns true if this result carries an error
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the error text, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure(f) => Some(&f.error),
            Self::Success(_) => None,
        }
    }

    /// Returns the report, if any
    pub fn report(&self) -> Option<&EnrichmentReport> {
        match self {
            Self::Success(r) => Some(r),
            Self::Failure(_) => None,
        }
    }
}

impl From<EnrichmentReport> for EnrichmentResult {
    fn from(report: EnrichmentReport) -> Self {
        Self::Success(report)
    }
}
