//! The consolidated response returned to the caller of `/scrape`

use crate::protocol::EnrichmentResult;
use crate::scrape::ParsedPage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overall outcome of a scrape request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Scraping and enrichment both succeeded
    Success,
    /// Scraping succeeded, enrichment did not
    PartialSuccess,
    /// The page could not be scraped
    Error,
}

/// Output of the scrape phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingData {
    pub title: String,
    pub links: Vec<String>,
    pub meta_tags: BTreeMap<String, String>,
    pub structure: BTreeMap<String, usize>,
    pub images_count: usize,
}

impl ScrapingData {
    /// Combines the parser's and the metadata extractor's output
    ///
    /// Image URLs are not part of the record; they only travel in the job.
    pub fn new(page: ParsedPage, meta_tags: BTreeMap<String, String>) -> Self {
        Self {
            title: page.title,
            links: page.links,
            meta_tags,
            structure: page.structure,
            images_count: page.images_count,
        }
    }
}

/// The full record for one scrape request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRecord {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub scraping_data: ScrapingData,
    pub processing_data: EnrichmentResult,
    pub status: RecordStatus,
}

impl ScrapeRecord {
    /// Builds the record from both halves and stamps it with the current time
    ///
    /// The status is `success` unless the enrichment half carries an error,
    /// in which case it is `partial_success`.
    pub fn consolidate(
        url: impl Into<String>,
        scraping_data: ScrapingData,
        processing_data: EnrichmentResult,
    ) -> Self {
        let status = if processing_data.is_failure() {
            RecordStatus::PartialSuccess
        } else {
            RecordStatus::Success
        };

        Self {
            url: url.into(),
            timestamp: Utc::now(),
            scraping_data,
            processing_data,
            status,
        }
    }
}

/// Body returned when the request fails before scraping completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: RecordStatus,
    pub url: Option<String>,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(url: Option<String>, message: impl Into<String>) -> Self {
        Self {
            status: RecordStatus::Error,
            url,
            message: message.into(),
        }
    }
}

/// Either a record or an error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScrapeResponse {
    Record(Box<ScrapeRecord>),
    Error(ErrorResponse),
}

impl ScrapeResponse {
    /// Returns the overall status
    pub fn status(&self) -> RecordStatus {
        match self {
            Self::Record(record) => record.status,
            Self::Error(error) => error.status,
        }
    }
}
