//! Crawler module for probing friend sites and running the periodic jobs
//!
//! This module contains the core crawling logic, including:
//! - The bounded worker pool used by every batch
//! - HTTP client construction and body decoding
//! - Home page parsing and the website health probe
//! - Job coordination and scheduling

mod coordinator;
mod dispatcher;
mod fetcher;
mod parser;
mod prober;
mod scheduler;

pub use coordinator::{Coordinator, CrawlSummary, IngestSummary, Job};
pub use dispatcher::{effective_concurrency, run_concurrently, DEFAULT_CONCURRENCY};
pub use fetcher::{build_feed_client, build_http_client, decode_body};
pub use parser::{parse_page, resolve_link, PageMetadata};
pub use prober::{probe, ProbeResult};
pub use scheduler::{JobTracker, Scheduler};

use crate::config::Config;
use crate::storage::{lock, open_storage, share, NewLink, SharedStorage, Storage};
use crate::CrawlerError;
use std::path::Path;

/// Opens the configured database and inserts the bootstrap links
///
/// Bootstrap links are only written into an empty link table.
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(SharedStorage)` - Storage ready for the coordinator
/// * `Err(CrawlerError)` - The database could not be opened or written
pub fn prepare_storage(config: &Config) -> Result<SharedStorage, CrawlerError> {
    let storage = share(open_storage(Path::new(&config.output.database_path))?);
    bootstrap(&storage, config)?;
    Ok(storage)
}

/// Inserts the configured links into an empty link table
pub fn bootstrap(storage: &SharedStorage, config: &Config) -> Result<usize, CrawlerError> {
    let links: Vec<NewLink> = config.links.iter().map(NewLink::from).collect();
    if links.is_empty() {
        return Ok(0);
    }

    let inserted = lock(storage)?.bootstrap_links(&links)?;
    if inserted > 0 {
        tracing::info!("Inserted {} bootstrap links", inserted);
    }
    Ok(inserted)
}

/// Runs the scheduler until interrupted
///
/// This is the main entry point of the daemon. It will:
/// 1. Open storage and insert bootstrap links
/// 2. Build the HTTP clients
/// 3. Optionally run a crawl and an ingest right away
/// 4. Trigger the three jobs on their cadences
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(())` - Scheduler stopped on request
/// * `Err(CrawlerError)` - Startup failed
pub async fn run_daemon(config: Config) -> Result<(), CrawlerError> {
    let storage = prepare_storage(&config)?;
    let coordinator = Coordinator::new(&config, storage)?;
    let scheduler = Scheduler::new(
        coordinator,
        config.schedule.clone(),
        config.crawler.scan_on_startup,
    );
    scheduler.run().await;
    Ok(())
}

/// Runs a single job against the configured database and returns
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `job` - The job to run
pub async fn run_once(config: Config, job: Job) -> Result<(), CrawlerError> {
    let storage = prepare_storage(&config)?;
    let coordinator = Coordinator::new(&config, storage)?;
    coordinator.run(job).await;
    Ok(())
}
