//! Feed registration
//!
//! Registers feeds discovered on friend sites, at most once per
//! (link, url) pair.

use crate::feed::{feed_title, fetch_feed, strip_tags, FeedError};
use crate::storage::{lock, FeedRecord, SharedStorage, Storage};
use crate::CrawlerError;
use reqwest::Client;

/// Outcome of a registration attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// The feed was new and has been stored
    Created(FeedRecord),
    /// The (link, url) pair was already registered
    AlreadyExists,
}

/// Creates feed records for discovered feed URLs
pub struct FeedRegistrar {
    storage: SharedStorage,
    client: Client,
}

impl FeedRegistrar {
    /// Creates a registrar
    ///
    /// # Arguments
    ///
    /// * `storage` - Shared storage
    /// * `client` - The feed HTTP client used to resolve feed titles
    pub fn new(storage: SharedStorage, client: Client) -> Self {
        Self { storage, client }
    }

    /// Registers one feed
    ///
    /// Existing registrations are detected before any network access. A new
    /// feed is fetched once to read its title and stored with status
    /// `survival`. A feed whose title cannot be resolved is not stored.
    ///
    /// # Arguments
    ///
    /// * `link_id` - Owning link, or None for a standalone feed
    /// * `url` - Absolute feed URL
    pub async fn register(
        &self,
        link_id: Option<i64>,
        url: &str,
    ) -> Result<Registration, CrawlerError> {
        if lock(&self.storage)?.feed_exists(link_id, url)? {
            tracing::trace!("Feed {} already registered", url);
            return Ok(Registration::AlreadyExists);
        }

        let feed = fetch_feed(&self.client, url).await?;
        let name = feed_title(&feed)
            .map(|title| strip_tags(&title))
            .filter(|title| !title.is_empty())
            .ok_or_else(|| FeedError::MissingTitle(url.to_string()))?;

        let created = lock(&self.storage)?.register_feed(link_id, url, &name)?;

        Ok(match created {
            Some(record) => {
                tracing::info!("Registered feed {} ({})", record.url, record.name);
                Registration::Created(record)
            }
            None => Registration::AlreadyExists,
        })
    }

    /// Registers every URL, logging and skipping failures
    ///
    /// # Returns
    ///
    /// The number of feeds created
    pub async fn register_all(&self, link_id: Option<i64>, urls: &[String]) -> usize {
        let mut created = 0;

        for url in urls {
            match self.register(link_id, url).await {
                Ok(Registration::Created(_)) => created += 1,
                Ok(Registration::AlreadyExists) => {}
                Err(e) => tracing::warn!("Failed to register feed {}: {}", url, e),
            }
        }

        created
    }
}
