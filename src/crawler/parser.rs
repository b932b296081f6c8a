//! HTML parser for extracting site metadata
//!
//! This module handles parsing a friend's home page to extract:
//! - The site description (`<meta name="description">`)
//! - The site icon (`icon`, `apple-touch-icon`, `shortcut icon` links)
//! - Advertised RSS/Atom feeds (`<link rel="alternate">`)

use scraper::{Html, Selector};
use url::Url;

/// Icon link selectors, in order of preference
const ICON_SELECTORS: [&str; 3] = [
    r#"link[rel="icon"][href]"#,
    r#"link[rel="apple-touch-icon"][href]"#,
    r#"link[rel="shortcut icon"][href]"#,
];

/// Feed MIME types accepted for discovery
const FEED_TYPES: [&str; 2] = ["application/rss+xml", "application/atom+xml"];

/// Metadata extracted from a home page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetadata {
    /// Content of `<meta name="description">`, or empty
    pub description: String,

    /// Absolute icon URL, or empty
    pub icon_url: String,

    /// Absolute URLs of advertised feeds, in document order
    pub feed_urls: Vec<String>,
}

/// Parses HTML content and extracts site metadata
///
/// # Arguments
///
/// * `html` - The decoded HTML content
/// * `base_url` - The final response URL, used to resolve relative hrefs
///
/// # Returns
///
/// The extracted metadata. Missing elements yield empty values.
///
/// # Example
///
/// ```no_run
/// use friend_crawler::crawler::parse_page;
/// use url::Url;
///
/// let html = r#"<head><link rel="shortcut icon" href="/f.ico"></head>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = parse_page(html, &base_url);
/// assert_eq!(page.icon_url, "https://example.com/f.ico");
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> PageMetadata {
    let document = Html::parse_document(html);

    PageMetadata {
        description: extract_description(&document),
        icon_url: extract_icon(&document, base_url).unwrap_or_default(),
        feed_urls: extract_feeds(&document, base_url),
    }
}

/// Extracts the meta description
fn extract_description(document: &Html) -> String {
    let Ok(selector) = Selector::parse(r#"meta[name="description"][content]"#) else {
        return String::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Extracts the first icon in order of preference
fn extract_icon(document: &Html, base_url: &Url) -> Option<String> {
    ICON_SELECTORS.iter().find_map(|raw| {
        let selector = Selector::parse(raw).ok()?;
        document
            .select(&selector)
            .filter_map(|element| element.value().attr("href"))
            .find_map(|href| resolve_link(href, base_url))
    })
}

/// Extracts advertised feed URLs
fn extract_feeds(document: &Html, base_url: &Url) -> Vec<String> {
    let mut feeds = Vec::new();

    let Ok(selector) = Selector::parse(r#"link[rel="alternate"][href]"#) else {
        return feeds;
    };

    for element in document.select(&selector) {
        let is_feed = element
            .value()
            .attr("type")
            .map(|t| {
                let t = t.trim().to_ascii_lowercase();
                FEED_TYPES.contains(&t.as_str())
            })
            .unwrap_or(false);

        if !is_feed {
            continue;
        }

        if let Some(url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        {
            if !feeds.contains(&url) {
                feeds.push(url);
            }
        }
    }

    feeds
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None for empty hrefs, `javascript:`/`data:` URIs, fragment-only
/// references and anything that does not resolve to http or https.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:") || href.starts_with("data:") {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
