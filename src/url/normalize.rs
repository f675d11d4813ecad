use crate::{UrlError, UrlResult};
use url::Url;

/// Schemes a scrape target may use
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Normalizes a scrape target as received on the query string
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject if empty
/// 2. Prefix `http://` when the target carries no `http://` or `https://` scheme
/// 3. Parse the URL; reject if malformed
/// 4. Reject schemes other than HTTP(S) and URLs without a host
///
/// The path, query and fragment are left untouched: the page is fetched
/// exactly as the caller asked for it.
///
/// # Examples
///
/// ```
/// use scrape_dispatch::url::normalize_target;
///
/// let url = normalize_target("example.com/about").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/about");
/// ```
pub fn normalize_target(raw: &str) -> UrlResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let candidate = if has_http_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Case-insensitive check for a leading `http://` or `https://`
fn has_http_scheme(target: &str) -> bool {
    let lower = target
        .get(..8)
        .unwrap_or(target)
        .to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_missing_scheme() {
        let result = normalize_target("example.com").unwrap();
        assert_eq!(result.as_str(), "http://example.com/");
    }

    #[test]
    fn test_keep_https() {
        let result = normalize_target("https://example.com/page?q=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?q=1");
    }

    #[test]
    fn test_keep_http() {
        let result = normalize_target("http://example.test").unwrap();
        assert_eq!(result.as_str(), "http://example.test/");
    }

    #[test]
    fn test_uppercase_scheme_is_recognized() {
        let result = normalize_target("HTTPS://Example.com/").unwrap();
        assert_eq!(result.scheme(), "https");
        assert_eq!(result.host_str(), Some("example.com"));
    }

    #[test]
    fn test_trims_whitespace() {
        let result = normalize_target("  example.com/a  ").unwrap();
        assert_eq!(result.as_str(), "http://example.com/a");
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(matches!(normalize_target("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_scheme_without_host_is_rejected() {
        assert!(normalize_target("http://").is_err());
    }

    #[test]
    fn test_keeps_port_and_fragment() {
        let result = normalize_target("127.0.0.1:8080/page#top").unwrap();
        assert_eq!(result.port(), Some(8080));
        assert_eq!(result.fragment(), Some("top"));
    }
}
