//! Scrape-Dispatch: a two-tier scrape and enrichment service
//!
//! This crate implements a lightweight front-end that fetches and parses pages,
//! and a back-end worker pool that performs the expensive enrichment (screenshot,
//! performance timing, thumbnails). The two tiers talk over TCP using a
//! length-prefixed JSON frame, one job per connection.

pub mod client;
pub mod config;
pub mod front;
pub mod protocol;
pub mod scrape;
pub mod url;
pub mod worker;

use thiserror::Error;

/// Main error type for Scrape-Dispatch operations
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Frame error: {0}")]
    Frame(#[from] protocol::FrameError),

    #[error("Network error talking to {addr}: {source}")]
    Network {
        addr: String,
        source: std::io::Error,
    },

    #[error("Timeout ({limit:?}) {stage}")]
    Timeout {
        stage: &'static str,
        limit: std::time::Duration,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Empty URL")]
    Empty,
}

/// Result type alias for Scrape-Dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use front::{RecordStatus, ScrapeRecord};
pub use protocol::{EnrichmentResult, FrameCodec, Job};
pub use url::normalize_target;
