//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::ProbeResult;
use crate::state::{FeedStatus, LinkStatus};
use crate::storage::{
    ArticleRecord, FeedFilter, FeedRecord, InsertOutcome, LinkFilter, LinkRecord, NewArticle,
    NewLink,
};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Link not found: {0}")]
    LinkNotFound(i64),

    #[error("Feed not found: {0}")]
    FeedNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the crawl and ingest
/// pipeline. Callers share one backend behind a mutex.
pub trait Storage {
    // ===== Link Management =====

    /// Inserts a new link in the `pending` state
    fn insert_link(&mut self, link: &NewLink) -> StorageResult<i64>;

    /// Inserts links from the bootstrap configuration
    ///
    /// Does nothing when the table already holds links. Otherwise every link
    /// whose URL is not yet present is inserted as `survival` with RSS enabled.
    ///
    /// # Returns
    ///
    /// The number of links inserted
    fn bootstrap_links(&mut self, links: &[NewLink]) -> StorageResult<usize>;

    /// Gets a link by ID
    fn get_link(&self, link_id: i64) -> StorageResult<LinkRecord>;

    /// Gets all links matching a filter
    fn query_links(&self, filter: &LinkFilter) -> StorageResult<Vec<LinkRecord>>;

    /// Applies a probe result to a link and persists the transition
    ///
    /// # Returns
    ///
    /// The link as written
    fn update_link(&mut self, link: &LinkRecord, probe: &ProbeResult)
        -> StorageResult<LinkRecord>;

    /// Sets a link's status directly (manual operations such as ignoring)
    fn set_link_status(&mut self, link_id: i64, status: LinkStatus) -> StorageResult<()>;

    // ===== Feed Management =====

    /// Checks whether a feed with this (link, url) pair is already registered
    fn feed_exists(&self, link_id: Option<i64>, url: &str) -> StorageResult<bool>;

    /// Registers a feed
    ///
    /// # Returns
    ///
    /// * `Some(FeedRecord)` - The newly created feed
    /// * `None` - The (link, url) pair was already registered
    fn register_feed(
        &mut self,
        link_id: Option<i64>,
        url: &str,
        name: &str,
    ) -> StorageResult<Option<FeedRecord>>;

    /// Gets a feed by ID
    fn get_feed(&self, feed_id: i64) -> StorageResult<FeedRecord>;

    /// Gets all feeds matching a filter
    fn query_feeds(&self, filter: FeedFilter) -> StorageResult<Vec<FeedRecord>>;

    // ===== Article Management =====

    /// Inserts an article unless one with the same link exists
    ///
    /// The unique index on `link` decides; a clash yields `Duplicate`.
    fn insert_article(&mut self, article: &NewArticle) -> StorageResult<InsertOutcome>;

    /// Gets all articles of a feed, newest first
    fn get_articles(&self, feed_id: i64) -> StorageResult<Vec<ArticleRecord>>;

    // ===== Statistics =====

    /// Counts links by status
    fn count_links_by_status(&self) -> StorageResult<HashMap<LinkStatus, u64>>;

    /// Counts links flagged as dead, leaving out ignored links
    fn count_died_links(&self) -> StorageResult<u64>;

    /// Counts feeds by status
    fn count_feeds_by_status(&self) -> StorageResult<HashMap<FeedStatus, u64>>;

    /// Counts all articles
    fn count_articles(&self) -> StorageResult<u64>;
}
