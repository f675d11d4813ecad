//! Integration tests for Scrape-Dispatch
//!
//! These tests run a real dispatcher and a real front-end router on
//! loopback ports, with stub enrichers in place of the browser and wiremock
//! serving the target pages.

mod common;
mod dispatch_tests;
mod scrape_tests;
