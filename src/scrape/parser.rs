//! HTML parser for the scrape phase
//!
//! This module handles parsing HTML content to extract:
//! - Page title
//! - Links (from <a> tags, resolved to absolute URLs)
//! - Image URLs and image count (from <img> tags)
//! - Heading structure (h1..h6 counts)

use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Title reported when the page has none
pub const MISSING_TITLE: &str = "No Title Found";

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: String,

    /// All links found on the page (absolute URLs, document order)
    pub links: Vec<String>,

    /// Heading counts keyed `h1`..`h6`
    pub structure: BTreeMap<String, usize>,

    /// Number of <img src> elements
    pub images_count: usize,

    /// Absolute image URLs, document order
    pub image_urls: Vec<String>,
}

/// Parses HTML content and extracts title, links, images and heading structure
///
/// # Extraction Rules
///
/// - Title: trimmed text of the first `<title>`; `"No Title Found"` if absent or blank
/// - Links: every non-empty `a[href]`, resolved against `base_url`
/// - Images: every `img[src]` counts; non-empty sources are resolved into `image_urls`
/// - Structure: count of each heading level, zeros included
///
/// Hrefs that cannot be resolved against the base URL are skipped.
///
/// # Example
///
/// ```
/// use scrape_dispatch::scrape::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><h1>A</h1><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, "Test");
/// assert_eq!(parsed.links, vec!["https://example.com/page".to_string()]);
/// assert_eq!(parsed.structure["h1"], 1);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_else(|| MISSING_TITLE.to_string());
    let links = extract_links(&document, base_url);
    let (images_count, image_urls) = extract_images(&document, base_url);
    let structure = extract_structure(&document);

    ParsedPage {
        title,
        links,
        structure,
        images_count,
        image_urls,
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts every link from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Counts images and resolves their sources
fn extract_images(document: &Html, base_url: &Url) -> (usize, Vec<String>) {
    let mut count = 0;
    let mut urls = Vec::new();

    if let Ok(img_selector) = Selector::parse("img[src]") {
        for element in document.select(&img_selector) {
            count += 1;
            if let Some(absolute_url) = element
                .value()
                .attr("src")
                .and_then(|src| resolve(src, base_url))
            {
                urls.push(absolute_url);
            }
        }
    }

    (count, urls)
}

/// Counts headings per level
fn extract_structure(document: &Html) -> BTreeMap<String, usize> {
    (1..=6)
        .map(|level| {
            let tag = format!("h{}", level);
            let count = Selector::parse(&tag)
                .map(|selector| document.select(&selector).count())
                .unwrap_or(0);
            (tag, count)
        })
        .collect()
}

/// Resolves a possibly relative reference against the base URL
///
/// Returns None for blank references and references the base cannot resolve.
fn resolve(reference: &str, base_url: &Url) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    base_url.join(reference).ok().map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>Test Page</title></head><body></body></html>"#;
        assert_eq!(parse_html(html, &base_url()).title, "Test Page");
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        assert_eq!(parse_html(html, &base_url()).title, "Test Page");
    }

    #[test]
    fn test_missing_title_placeholder() {
        let html = r#"<html><head></head><body></body></html>"#;
        assert_eq!(parse_html(html, &base_url()).title, MISSING_TITLE);

        let blank = r#"<html><head><title>   </title></head></html>"#;
        assert_eq!(parse_html(blank, &base_url()).title, MISSING_TITLE);
    }

    #[test]
    fn test_extract_absolute_and_relative_links() {
        let html = r#"
            <html><body>
                <a href="https://other.com/page">Abs</a>
                <a href="/root">Root</a>
                <a href="sibling">Sibling</a>
            </body></html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(
            parsed.links,
            vec![
                "https://other.com/page".to_string(),
                "https://example.com/root".to_string(),
                "https://example.com/sibling".to_string(),
            ]
        );
    }

    #[test]
    fn test_skip_blank_href() {
        let html = r#"<html><body><a href="   ">Blank</a><a href="">Empty</a></body></html>"#;
        assert!(parse_html(html, &base_url()).links.is_empty());
    }

    #[test]
    fn test_keeps_non_http_links() {
        let html = r#"<html><body><a href="mailto:test@example.com">Email</a></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.links, vec!["mailto:test@example.com".to_string()]);
    }

    #[test]
    fn test_images_counted_and_resolved() {
        let html = r#"
            <html><body>
                <img src="/a.png">
                <img src="https://cdn.example.com/b.jpg">
                <img src="  ">
                <img alt="no source">
            </body></html>
        "#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.images_count, 3);
        assert_eq!(
            parsed.image_urls,
            vec![
                "https://example.com/a.png".to_string(),
                "https://cdn.example.com/b.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_structure_counts_all_levels() {
        let html = r#"
            <html><body>
                <h1>One</h1>
                <h2>Two</h2><h2>Two again</h2>
                <h6>Six</h6>
            </body></html>
        "#;
        let structure = parse_html(html, &base_url()).structure;
        assert_eq!(structure.len(), 6);
        assert_eq!(structure["h1"], 1);
        assert_eq!(structure["h2"], 2);
        assert_eq!(structure["h3"], 0);
        assert_eq!(structure["h4"], 0);
        assert_eq!(structure["h5"], 0);
        assert_eq!(structure["h6"], 1);
    }

    #[test]
    fn test_empty_document() {
        let parsed = parse_html("", &base_url());
        assert_eq!(parsed.title, MISSING_TITLE);
        assert!(parsed.links.is_empty());
        assert_eq!(parsed.images_count, 0);
        assert!(parsed.structure.values().all(|&c| c == 0));
    }
}
