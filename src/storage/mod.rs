//! Storage module for persisting links, feeds and articles
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Link selection for crawl batches and post-probe updates
//! - Feed registration with (link, url) deduplication
//! - Article insertion with link-based deduplication

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{init_database, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::LinkEntry;
use crate::state::{FeedStatus, LinkStatus};
use crate::CrawlerError;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Storage handle shared between workers
///
/// The lock is only ever held for synchronous database calls, never across
/// an `.await`.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Wraps a storage backend for sharing between workers
pub fn share(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Locks shared storage
///
/// A poisoned lock is reported as a database error.
pub fn lock(storage: &SharedStorage) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
    storage
        .lock()
        .map_err(|e| StorageError::Database(format!("Storage lock poisoned: {}", e)))
}

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(CrawlerError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, CrawlerError> {
    SqliteStorage::new(path)
}

/// Represents a friend link in the database
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub icon: String,
    pub description: String,
    pub email: String,
    pub status: LinkStatus,
    pub failure_count: u32,
    pub is_died: bool,
    pub rss_enabled: bool,
    pub updated_at: String,
}

impl fmt::Display for LinkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{} {}", self.id, self.url)
    }
}

/// A friend link to be inserted
#[derive(Debug, Clone, Default)]
pub struct NewLink {
    pub name: String,
    pub url: String,
    pub icon: String,
    pub description: String,
    pub email: String,
    pub rss_enabled: bool,
}

impl From<&LinkEntry> for NewLink {
    fn from(entry: &LinkEntry) -> Self {
        Self {
            name: entry.name.clone(),
            url: entry.url.clone(),
            icon: entry.icon.clone(),
            description: entry.description.clone(),
            email: entry.email.clone(),
            rss_enabled: true,
        }
    }
}

/// Represents a registered feed
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord {
    pub id: i64,
    pub link_id: Option<i64>,
    pub url: String,
    pub name: String,
    pub status: FeedStatus,
    pub updated_at: i64,
}

impl fmt::Display for FeedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed#{} {}", self.id, self.url)
    }
}

/// Represents an ingested article
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: String,
    pub published: i64,
}

/// An article to be inserted
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub feed_id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: String,
    pub published: i64,
}

/// Outcome of an article insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written with this ID
    Inserted(i64),
    /// An article with the same link already exists
    Duplicate,
}

/// Filter used to select links for a batch
///
/// All set fields are combined with AND. `statuses` is an IN clause, or a
/// NOT IN clause when `not_in` is set.
#[derive(Debug, Clone, Default)]
pub struct LinkFilter {
    pub status: Option<LinkStatus>,
    pub statuses: Vec<LinkStatus>,
    pub not_in: bool,
    pub is_died: Option<bool>,
}

impl LinkFilter {
    /// Links due for the regular crawl: alive and not ignored
    pub fn crawlable() -> Self {
        Self {
            statuses: vec![LinkStatus::Ignored, LinkStatus::Died],
            not_in: true,
            is_died: Some(false),
            ..Self::default()
        }
    }

    /// Dead links due for the recovery check
    pub fn died() -> Self {
        Self {
            statuses: vec![LinkStatus::Ignored],
            not_in: true,
            is_died: Some(true),
            ..Self::default()
        }
    }
}

/// Filter used to select feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFilter {
    /// Every feed
    All,
    /// Feeds with exactly this status
    Status(FeedStatus),
    /// Feeds due for ingestion: not paused, and the owning link (if any) is
    /// neither ignored nor dead and has RSS enabled
    Valid,
}
