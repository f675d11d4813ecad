//! Front-end of the system: the HTTP scrape service
//!
//! This module contains:
//! - The axum router serving `/scrape`
//! - The per-job TCP link to the worker dispatcher
//! - The consolidated record returned to callers

mod processor;
mod record;
mod server;

pub use processor::ProcessorLink;
pub use record::{ErrorResponse, RecordStatus, ScrapeRecord, ScrapeResponse, ScrapingData};
pub use server::{router, scrape, serve, AppState, ScrapeParams};
