//! Crawler coordinator - the three batch jobs
//!
//! This module wires storage, the worker pool, the prober, the link state
//! machine and the feed registrar/ingestor together into:
//! - The full crawl of live links
//! - The recovery check of dead links
//! - The ingestion of all valid feeds

use crate::config::Config;
use crate::crawler::dispatcher::run_concurrently;
use crate::crawler::fetcher::{build_feed_client, build_http_client};
use crate::crawler::prober::{probe, ProbeResult};
use crate::feed::{FeedIngestor, FeedRegistrar, IngestReport};
use crate::state::is_failure;
use crate::storage::{lock, FeedFilter, LinkFilter, LinkRecord, SharedStorage, Storage};
use crate::CrawlerError;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The periodic jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    /// Probe every crawlable link
    Crawl,
    /// Probe every dead link
    Recovery,
    /// Ingest every valid feed
    Ingest,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Crawl => write!(f, "link crawl"),
            Job::Recovery => write!(f, "recovery check"),
            Job::Ingest => write!(f, "feed ingest"),
        }
    }
}

/// Counters for one link batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Links probed
    pub probed: usize,
    /// Probes classified as survival
    pub survived: usize,
    /// Probes classified as timeout or error
    pub failed: usize,
    /// Links that crossed the death threshold in this batch
    pub newly_died: usize,
    /// Dead links that answered again
    pub revived: usize,
    /// Link updates that could not be persisted
    pub update_errors: usize,
    /// Feeds registered from discovered URLs
    pub feeds_registered: usize,
}

/// Counters for one ingestion batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Feeds processed
    pub feeds: usize,
    /// Feeds whose fetch or parse failed
    pub feed_errors: usize,
    /// Article counters summed over all feeds
    pub articles: IngestReport,
}

/// Result of probing and updating one link
struct LinkOutcome {
    link: LinkRecord,
    probe: ProbeResult,
    updated: Option<LinkRecord>,
}

/// Main coordinator structure
pub struct Coordinator {
    storage: SharedStorage,
    probe_client: Client,
    registrar: FeedRegistrar,
    ingestor: Arc<FeedIngestor>,
    concurrency: i64,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - Shared storage
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlerError)` - An HTTP client could not be built
    pub fn new(config: &Config, storage: SharedStorage) -> Result<Self, CrawlerError> {
        let probe_client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.probe_timeout_seconds),
        )?;
        let feed_client = build_feed_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.rss_timeout_seconds),
        )?;

        Ok(Self {
            registrar: FeedRegistrar::new(storage.clone(), feed_client.clone()),
            ingestor: Arc::new(FeedIngestor::new(storage.clone(), feed_client)),
            storage,
            probe_client,
            concurrency: config.crawler.concurrency,
        })
    }

    /// Runs one job and logs its outcome
    ///
    /// Errors are logged here and never propagated to the caller.
    pub async fn run(&self, job: Job) {
        let started = Instant::now();
        tracing::info!("Starting {}", job);

        match job {
            Job::Crawl => match self.run_link_crawl().await {
                Ok(summary) => log_crawl_summary(job, &summary, started),
                Err(e) => tracing::error!("{} failed: {}", job, e),
            },
            Job::Recovery => match self.run_recovery_check().await {
                Ok(summary) => log_crawl_summary(job, &summary, started),
                Err(e) => tracing::error!("{} failed: {}", job, e),
            },
            Job::Ingest => match self.run_feed_ingest().await {
                Ok(summary) => tracing::info!(
                    "Finished {} in {:.1}s: {} feeds ({} failed), {} new articles, {} known, {} skipped, {} insert errors",
                    job,
                    started.elapsed().as_secs_f64(),
                    summary.feeds,
                    summary.feed_errors,
                    summary.articles.inserted,
                    summary.articles.duplicates,
                    summary.articles.skipped,
                    summary.articles.failed
                ),
                Err(e) => tracing::error!("{} failed: {}", job, e),
            },
        }
    }

    /// Probes every live, non-ignored link and registers discovered feeds
    pub async fn run_link_crawl(&self) -> Result<CrawlSummary, CrawlerError> {
        self.run_link_batch(&LinkFilter::crawlable()).await
    }

    /// Probes every dead link so that recovered sites are revived
    pub async fn run_recovery_check(&self) -> Result<CrawlSummary, CrawlerError> {
        self.run_link_batch(&LinkFilter::died()).await
    }

    /// Ingests every valid feed
    pub async fn run_feed_ingest(&self) -> Result<IngestSummary, CrawlerError> {
        let feeds = lock(&self.storage)?.query_feeds(FeedFilter::Valid)?;

        let mut summary = IngestSummary {
            feeds: feeds.len(),
            ..IngestSummary::default()
        };

        let ingestor = Arc::clone(&self.ingestor);
        let reports = run_concurrently(
            feeds,
            move |feed| {
                let ingestor = Arc::clone(&ingestor);
                async move {
                    match ingestor.ingest(&feed).await {
                        Ok(report) => Some(report),
                        Err(e) => {
                            tracing::warn!("Ingestion of {} failed: {}", feed.url, e);
                            None
                        }
                    }
                }
            },
            self.concurrency,
        )
        .await;

        for report in reports {
            match report {
                Some(report) => summary.articles.merge(&report),
                None => summary.feed_errors += 1,
            }
        }

        Ok(summary)
    }

    /// Probes one batch of links, persists the transitions and registers feeds
    async fn run_link_batch(&self, filter: &LinkFilter) -> Result<CrawlSummary, CrawlerError> {
        let links = lock(&self.storage)?.query_links(filter)?;

        let mut summary = CrawlSummary {
            probed: links.len(),
            ..CrawlSummary::default()
        };

        if links.is_empty() {
            return Ok(summary);
        }

        let client = self.probe_client.clone();
        let storage = self.storage.clone();
        let outcomes = run_concurrently(
            links,
            move |link| {
                let client = client.clone();
                let storage = storage.clone();
                async move { probe_and_update(&client, &storage, link).await }
            },
            self.concurrency,
        )
        .await;

        for outcome in &outcomes {
            if is_failure(outcome.probe.status) {
                summary.failed += 1;
            } else {
                summary.survived += 1;
            }

            match &outcome.updated {
                Some(updated) => {
                    if updated.is_died && !outcome.link.is_died {
                        summary.newly_died += 1;
                        tracing::info!("{} is now considered dead", outcome.link);
                    } else if !updated.is_died && outcome.link.is_died {
                        summary.revived += 1;
                        tracing::info!("{} is alive again", outcome.link);
                    }
                }
                None => summary.update_errors += 1,
            }
        }

        // Feed registration runs only after the whole batch has been probed
        for outcome in outcomes {
            let rss_enabled = outcome
                .updated
                .as_ref()
                .map_or(outcome.link.rss_enabled, |link| link.rss_enabled);

            if !rss_enabled || outcome.probe.discovered_feed_urls.is_empty() {
                continue;
            }

            summary.feeds_registered += self
                .registrar
                .register_all(Some(outcome.link.id), &outcome.probe.discovered_feed_urls)
                .await;
        }

        Ok(summary)
    }
}

/// Probes one link and persists the resulting transition
///
/// A failed database write is logged; the link keeps its previous state.
async fn probe_and_update(client: &Client, storage: &SharedStorage, link: LinkRecord) -> LinkOutcome {
    let result = probe(client, &link.url).await;

    let updated = match lock(storage).and_then(|mut guard| guard.update_link(&link, &result)) {
        Ok(updated) => Some(updated),
        Err(e) => {
            tracing::error!("Failed to update {}: {}", link, e);
            None
        }
    };

    LinkOutcome {
        link,
        probe: result,
        updated,
    }
}

fn log_crawl_summary(job: Job, summary: &CrawlSummary, started: Instant) {
    tracing::info!(
        "Finished {} in {:.1}s: {} probed, {} alive, {} failed, {} newly dead, {} revived, {} feeds registered",
        job,
        started.elapsed().as_secs_f64(),
        summary.probed,
        summary.survived,
        summary.failed,
        summary.newly_died,
        summary.revived,
        summary.feeds_registered
    );

    if summary.update_errors > 0 {
        tracing::warn!(
            "{}: {} link updates could not be written",
            job,
            summary.update_errors
        );
    }
}
