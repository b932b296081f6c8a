//! Article ingestion
//!
//! Fetches a registered feed, converts its entries into articles and stores
//! the ones not seen before.

use crate::feed::{fetch_feed, strip_tags};
use crate::storage::{lock, FeedRecord, InsertOutcome, NewArticle, SharedStorage, Storage};
use crate::CrawlerError;
use feed_rs::model::{Entry, Feed, Link, Person};
use reqwest::Client;

/// Counters for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Articles written
    pub inserted: usize,
    /// Entries whose link was already stored
    pub duplicates: usize,
    /// Entries without a timestamp or link
    pub skipped: usize,
    /// Entries whose insert failed
    pub failed: usize,
}

impl IngestReport {
    /// Adds another report's counters to this one
    pub fn merge(&mut self, other: &IngestReport) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Ingests articles from registered feeds
pub struct FeedIngestor {
    storage: SharedStorage,
    client: Client,
}

impl FeedIngestor {
    /// Creates an ingestor
    ///
    /// # Arguments
    ///
    /// * `storage` - Shared storage
    /// * `client` - The feed HTTP client (carries the fetch timeout)
    pub fn new(storage: SharedStorage, client: Client) -> Self {
        Self { storage, client }
    }

    /// Ingests one feed
    ///
    /// A fetch or parse failure aborts this feed only. Individual insert
    /// failures are logged and counted; the remaining entries are still
    /// processed.
    pub async fn ingest(&self, feed: &FeedRecord) -> Result<IngestReport, CrawlerError> {
        let parsed = fetch_feed(&self.client, &feed.url).await?;
        let (articles, skipped) = entries_to_articles(feed.id, &feed.name, &parsed);

        let mut report = IngestReport {
            skipped,
            ..IngestReport::default()
        };

        let mut storage = lock(&self.storage)?;
        for article in &articles {
            match storage.insert_article(article) {
                Ok(InsertOutcome::Inserted(_)) => report.inserted += 1,
                Ok(InsertOutcome::Duplicate) => report.duplicates += 1,
                Err(e) => {
                    tracing::warn!("Failed to store article {}: {}", article.link, e);
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Feed {}: {} new, {} known, {} skipped, {} failed",
            feed.url,
            report.inserted,
            report.duplicates,
            report.skipped,
            report.failed
        );

        Ok(report)
    }
}

/// Converts parsed feed entries into articles
///
/// Entries without a published or updated timestamp, or without any link,
/// are dropped and counted as skipped.
///
/// # Arguments
///
/// * `feed_id` - ID of the registered feed
/// * `feed_name` - Registered feed name, used as the last author fallback
/// * `parsed` - The parsed feed document
///
/// # Returns
///
/// The articles and the number of skipped entries
pub fn entries_to_articles(feed_id: i64, feed_name: &str, parsed: &Feed) -> (Vec<NewArticle>, usize) {
    let mut articles = Vec::with_capacity(parsed.entries.len());
    let mut skipped = 0;

    for entry in &parsed.entries {
        let Some(timestamp) = entry.published.or(entry.updated) else {
            tracing::trace!("Skipping entry {} without timestamp", entry.id);
            skipped += 1;
            continue;
        };

        let Some(link) = select_entry_link(&entry.links) else {
            tracing::trace!("Skipping entry {} without link", entry.id);
            skipped += 1;
            continue;
        };

        articles.push(NewArticle {
            feed_id,
            title: entry
                .title
                .as_ref()
                .map(|title| strip_tags(&title.content))
                .unwrap_or_default(),
            link,
            description: entry_description(entry),
            author: entry_author(entry, feed_name),
            published: timestamp.timestamp().max(0),
        });
    }

    (articles, skipped)
}

/// Picks the entry's permalink
///
/// Prefers the first `alternate` or rel-less link, then the first link.
fn select_entry_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|link| link.href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Summary, falling back to the content body, with markup stripped
fn entry_description(entry: &Entry) -> String {
    entry
        .summary
        .as_ref()
        .map(|summary| summary.content.as_str())
        .filter(|summary| !summary.trim().is_empty())
        .or_else(|| entry.content.as_ref().and_then(|content| content.body.as_deref()))
        .map(strip_tags)
        .unwrap_or_default()
}

/// Names the parser fills in when a person element carries no name
const PLACEHOLDER_NAMES: &[&str] = &["author", "unknown"];

/// Resolves the author
///
/// Primary author name, then primary author email, then the first non-empty
/// name or email among the remaining authors, then the feed name.
fn entry_author(entry: &Entry, feed_name: &str) -> String {
    let mut contacts = entry.authors.iter().map(contact);

    let primary = contacts.next().and_then(|(name, email)| name.or(email));

    primary
        .or_else(|| contacts.find_map(|(name, email)| name.or(email)))
        .or_else(|| non_empty(feed_name))
        .unwrap_or_default()
}

/// Name and email of a person
///
/// RSS `<author>` holds `email (Name)` and is parsed with the element name
/// standing in for the person's name.
fn contact(person: &Person) -> (Option<String>, Option<String>) {
    let mut name =
        non_empty(&person.name).filter(|name| !PLACEHOLDER_NAMES.contains(&name.as_str()));
    let mut email = person.email.as_deref().and_then(non_empty);

    if let Some(raw) = email.clone() {
        if let Some((address, rest)) = raw.split_once('(') {
            if let Some(embedded) = rest.strip_suffix(')') {
                name = name.or_else(|| non_empty(embedded));
                email = non_empty(address).or(email);
            }
        }
    }

    (name, email)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
