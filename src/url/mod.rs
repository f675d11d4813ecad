//! URL handling module for Scrape-Dispatch
//!
//! This module provides scrape-target normalization and endpoint building
//! for the HTTP and TCP legs of a job.

mod normalize;

pub use normalize::normalize_target;

/// Formats a `host:port` pair, bracketing IPv6 literals
///
/// # Examples
///
/// ```
/// use scrape_dispatch::url::host_port;
///
/// assert_eq!(host_port("127.0.0.1", 8001), "127.0.0.1:8001");
/// assert_eq!(host_port("::1", 8001), "[::1]:8001");
/// ```
pub fn host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Builds the `/scrape` endpoint of a front-end listening on `host:port`
///
/// # Examples
///
/// ```
/// use scrape_dispatch::url::scrape_endpoint;
///
/// assert_eq!(scrape_endpoint("::1", 8080), "http://[::1]:8080/scrape");
/// ```
pub fn scrape_endpoint(host: &str, port: u16) -> String {
    format!("http://{}/scrape", host_port(host, port))
}
