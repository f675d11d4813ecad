//! Meta tag extraction
//!
//! Collects description, keywords, Open Graph and Twitter card tags.

use scraper::{Html, Selector};
use std::collections::BTreeMap;

/// Meta keys (from `name` or `property`) that are reported
pub const META_KEYS: &[&str] = &[
    "description",
    "keywords",
    "og:title",
    "og:description",
    "og:image",
    "twitter:card",
    "twitter:title",
];

/// Extracts the recognized meta tags from an HTML document
///
/// The key is taken from `name`, falling back to `property`. Tags without a
/// non-empty `content` are ignored; a later tag with the same key wins.
///
/// # Example
///
/// ```
/// use scrape_dispatch::scrape::extract_meta_tags;
///
/// let html = r#"<meta name="description" content="A page"><meta name="viewport" content="x">"#;
/// let tags = extract_meta_tags(html);
/// assert_eq!(tags.get("description").map(String::as_str), Some("A page"));
/// assert!(!tags.contains_key("viewport"));
/// ```
pub fn extract_meta_tags(html: &str) -> BTreeMap<String, String> {
    let document = Html::parse_document(html);
    let mut tags = BTreeMap::new();

    let Ok(selector) = Selector::parse("meta") else {
        return tags;
    };

    for element in document.select(&selector) {
        let attrs = element.value();
        let Some(key) = attrs
            .attr("name")
            .filter(|k| !k.is_empty())
            .or_else(|| attrs.attr("property"))
        else {
            continue;
        };

        if !META_KEYS.contains(&key) {
            continue;
        }

        if let Some(content) = attrs.attr("content").filter(|c| !c.is_empty()) {
            tags.insert(key.to_string(), content.to_string());
        }
    }

    tags
}
