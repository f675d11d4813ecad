//! Worker side of the system: the enrichment dispatcher
//!
//! This module contains:
//! - The `Enricher` seam and the default page enricher
//! - A bounded worker pool that isolates each enrichment task
//! - The TCP dispatcher that turns one connection into one job

mod dispatcher;
mod enricher;
mod pool;

pub use dispatcher::Dispatcher;
pub use enricher::{Enricher, PageEnricher};
pub use pool::{JobHandle, WorkerPool};

use thiserror::Error;

/// Errors raised inside an enrichment task
///
/// These never take down the dispatcher; they are reported to the caller as
/// a failure result.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Failed to load page {url}: {message}")]
    PageLoad { url: String, message: String },

    #[error("Enrichment task panicked: {0}")]
    Panicked(String),

    #[error("Enrichment task was cancelled")]
    Cancelled,

    #[error("Worker pool is closed")]
    PoolClosed,

    #[error("Enrichment failed: {0}")]
    Other(String),
}
