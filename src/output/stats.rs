//! Statistics generation from the link database
//!
//! This module provides functionality for extracting and displaying
//! link, feed and article statistics from the storage layer.

use crate::state::{FeedStatus, LinkStatus};
use crate::storage::Storage;
use crate::CrawlerError;
use std::collections::HashMap;

/// Database statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Total number of links
    pub total_links: u64,

    /// Count of links by last status
    pub links_by_status: HashMap<LinkStatus, u64>,

    /// Number of dead links that are not ignored
    pub died_links: u64,

    /// Total number of registered feeds
    pub total_feeds: u64,

    /// Count of feeds by status
    pub feeds_by_status: HashMap<FeedStatus, u64>,

    /// Total number of ingested articles
    pub total_articles: u64,
}

impl CrawlStatistics {
    /// Share of links that are neither dead nor ignored, in percent
    pub fn alive_rate(&self) -> f64 {
        let ignored = self
            .links_by_status
            .get(&LinkStatus::Ignored)
            .copied()
            .unwrap_or(0);
        let monitored = self.total_links.saturating_sub(ignored);
        if monitored == 0 {
            return 0.0;
        }
        let alive = monitored.saturating_sub(self.died_links);
        (alive as f64 / monitored as f64) * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(CrawlerError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, CrawlerError> {
    let links_by_status = storage.count_links_by_status()?;
    let feeds_by_status = storage.count_feeds_by_status()?;

    Ok(CrawlStatistics {
        total_links: links_by_status.values().sum(),
        links_by_status,
        died_links: storage.count_died_links()?,
        total_feeds: feeds_by_status.values().sum(),
        feeds_by_status,
        total_articles: storage.count_articles()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Friend Link Statistics ===\n");

    println!("Overview:");
    println!("  Total links: {}", stats.total_links);
    println!("  Dead links: {}", stats.died_links);
    println!("  Registered feeds: {}", stats.total_feeds);
    println!("  Ingested articles: {}", stats.total_articles);
    println!();

    println!("Links by Status:");
    for status in LinkStatus::all_statuses() {
        if let Some(count) = stats.links_by_status.get(&status) {
            let percentage = if stats.total_links > 0 {
                (*count as f64 / stats.total_links as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", status, count, percentage);
        }
    }
    println!();

    if !stats.feeds_by_status.is_empty() {
        println!("Feeds by Status:");
        for status in FeedStatus::all_statuses() {
            if let Some(count) = stats.feeds_by_status.get(&status) {
                println!("  {}: {}", status, count);
            }
        }
        println!();
    }

    println!("Alive Rate: {:.1}% of monitored links", stats.alive_rate());
}
