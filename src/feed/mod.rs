//! Feed registration and article ingestion
//!
//! This module handles RSS/Atom/JSON feeds discovered on friend sites:
//! - Registering newly discovered feeds once per (link, url)
//! - Fetching and parsing feeds with `feed-rs`
//! - Turning entries into sanitized, deduplicated articles

mod ingestor;
mod registrar;
mod sanitize;

pub use ingestor::{entries_to_articles, FeedIngestor, IngestReport};
pub use registrar::{FeedRegistrar, Registration};
pub use sanitize::strip_tags;

use feed_rs::model::Feed;
use reqwest::Client;
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while fetching or parsing a feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to fetch feed {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("Feed {url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to parse feed {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Feed {0} has no title")]
    MissingTitle(String),
}

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Fetches and parses a feed
///
/// # Arguments
///
/// * `client` - The feed HTTP client (carries the fetch timeout)
/// * `url` - The feed URL
///
/// # Returns
///
/// * `Ok(Feed)` - The parsed feed
/// * `Err(FeedError)` - Network failure, non-2xx answer or unparseable document
pub async fn fetch_feed(client: &Client, url: &str) -> FeedResult<Feed> {
    let response = client.get(url).send().await.map_err(|source| FeedError::Fetch {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|source| FeedError::Fetch {
        url: url.to_string(),
        source,
    })?;

    feed_rs::parser::parse(Cursor::new(bytes)).map_err(|e| FeedError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Returns the trimmed feed title, if any
pub fn feed_title(feed: &Feed) -> Option<String> {
    feed.title
        .as_ref()
        .map(|title| title.content.trim().to_string())
        .filter(|title| !title.is_empty())
}
