//! Scheduler for the periodic jobs
//!
//! This module handles:
//! - Fixed-cadence triggers for the crawl, recovery and ingest jobs
//! - The optional startup run (crawl, then ingest)
//! - Instrumentation of overlapping runs of the same job
//!
//! Overlapping runs are logged, not prevented.

use crate::config::ScheduleConfig;
use crate::crawler::coordinator::{Coordinator, Job};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

const SECONDS_PER_HOUR: u64 = 3600;

/// Tracks how many runs of each job are in flight
#[derive(Debug, Default)]
pub struct JobTracker {
    crawl: AtomicUsize,
    recovery: AtomicUsize,
    ingest: AtomicUsize,
}

impl JobTracker {
    fn counter(&self, job: Job) -> &AtomicUsize {
        match job {
            Job::Crawl => &self.crawl,
            Job::Recovery => &self.recovery,
            Job::Ingest => &self.ingest,
        }
    }

    /// Marks a run as started
    ///
    /// # Returns
    ///
    /// The number of runs of the same job that were already in flight
    pub fn start(&self, job: Job) -> usize {
        self.counter(job).fetch_add(1, Ordering::SeqCst)
    }

    /// Marks a run as finished
    pub fn finish(&self, job: Job) {
        self.counter(job).fetch_sub(1, Ordering::SeqCst);
    }

    /// Returns the number of runs of a job currently in flight
    pub fn in_flight(&self, job: Job) -> usize {
        self.counter(job).load(Ordering::SeqCst)
    }
}

/// Runs the periodic jobs until the process is interrupted
pub struct Scheduler {
    coordinator: Arc<Coordinator>,
    tracker: Arc<JobTracker>,
    schedule: ScheduleConfig,
    scan_on_startup: bool,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `coordinator` - Executes the jobs
    /// * `schedule` - Job cadences
    /// * `scan_on_startup` - Whether to crawl and ingest immediately
    pub fn new(coordinator: Coordinator, schedule: ScheduleConfig, scan_on_startup: bool) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            tracker: Arc::new(JobTracker::default()),
            schedule,
            scan_on_startup,
        }
    }

    /// Returns the cadence of a job
    pub fn period(&self, job: Job) -> Duration {
        let hours = match job {
            Job::Crawl => self.schedule.crawl_interval_hours,
            Job::Recovery => self.schedule.recovery_interval_hours,
            Job::Ingest => self.schedule.ingest_interval_hours,
        };
        Duration::from_secs(hours.max(1) * SECONDS_PER_HOUR)
    }

    /// Runs until Ctrl-C is received
    ///
    /// Every trigger spawns its job on its own task, so a slow run never
    /// delays the other cadences. Runs still in flight at shutdown are
    /// dropped.
    pub async fn run(self) {
        tracing::info!(
            "Scheduler started: crawl every {}h, recovery every {}h, ingest every {}h",
            self.schedule.crawl_interval_hours,
            self.schedule.recovery_interval_hours,
            self.schedule.ingest_interval_hours
        );

        if self.scan_on_startup {
            let coordinator = Arc::clone(&self.coordinator);
            let tracker = Arc::clone(&self.tracker);
            tokio::spawn(async move {
                run_tracked(&coordinator, &tracker, Job::Crawl).await;
                run_tracked(&coordinator, &tracker, Job::Ingest).await;
            });
        }

        let mut crawl = self.ticker(Job::Crawl);
        let mut recovery = self.ticker(Job::Recovery);
        let mut ingest = self.ticker(Job::Ingest);

        loop {
            let job = tokio::select! {
                _ = crawl.tick() => Job::Crawl,
                _ = recovery.tick() => Job::Recovery,
                _ = ingest.tick() => Job::Ingest,
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!("Failed to listen for shutdown signal: {}", e);
                    }
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
            };

            self.trigger(job);
        }
    }

    /// Spawns one run of a job
    pub fn trigger(&self, job: Job) {
        let coordinator = Arc::clone(&self.coordinator);
        let tracker = Arc::clone(&self.tracker);
        tokio::spawn(async move {
            run_tracked(&coordinator, &tracker, job).await;
        });
    }

    /// Returns the in-flight tracker
    pub fn tracker(&self) -> Arc<JobTracker> {
        Arc::clone(&self.tracker)
    }

    /// Builds the interval for a job; the first tick fires one period from now
    fn ticker(&self, job: Job) -> Interval {
        let period = self.period(job);
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}

/// Runs a job while recording it in the tracker
async fn run_tracked(coordinator: &Coordinator, tracker: &JobTracker, job: Job) {
    let already_running = tracker.start(job);
    if already_running > 0 {
        tracing::warn!(
            "{} triggered while {} previous run(s) still in progress",
            job,
            already_running
        );
    }

    coordinator.run(job).await;
    tracker.finish(job);
}
