//! Scrape phase of a request: fetch the page, then parse it
//!
//! This module contains the lightweight half of the work, done by the
//! front-end itself:
//! - HTTP fetching with a bounded timeout
//! - HTML parsing (title, links, images, heading structure)
//! - Meta tag extraction

mod fetcher;
mod metadata;
mod parser;

pub use fetcher::{build_http_client, fetch_page, FetchError};
pub use metadata::{extract_meta_tags, META_KEYS};
pub use parser::{parse_html, ParsedPage, MISSING_TITLE};
