//! Friend-Crawler main entry point
//!
//! This is the command-line interface for the friend link crawler.

use clap::{Parser, ValueEnum};
use friend_crawler::config::{load_config_with_hash, Config};
use friend_crawler::crawler::{run_daemon, run_once, Job};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Friend-Crawler: liveness prober and feed ingestor for friend links
///
/// Friend-Crawler periodically probes a directory of friend websites,
/// tracks which of them are alive, discovers their RSS/Atom feeds and
/// stores new articles from those feeds.
#[derive(Parser, Debug)]
#[command(name = "friend-crawler")]
#[command(version)]
#[command(about = "Liveness prober and feed ingestor for friend links", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single job and exit instead of starting the scheduler
    #[arg(long, value_enum, conflicts_with_all = ["dry_run", "stats"])]
    once: Option<OnceJob>,

    /// Validate config and show what would be scheduled without touching the network
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

/// Jobs selectable with `--once`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OnceJob {
    /// Probe every live link
    Crawl,
    /// Probe every dead link
    Recover,
    /// Ingest every valid feed
    Ingest,
}

impl From<OnceJob> for Job {
    fn from(job: OnceJob) -> Self {
        match job {
            OnceJob::Crawl => Job::Crawl,
            OnceJob::Recover => Job::Recovery,
            OnceJob::Ingest => Job::Ingest,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(job) = cli.once {
        run_once(config, job.into()).await?;
    } else {
        handle_daemon(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("friend_crawler=info,warn"),
            1 => EnvFilter::new("friend_crawler=debug,info"),
            2 => EnvFilter::new("friend_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Friend-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Probe timeout: {}s", config.crawler.probe_timeout_seconds);
    println!("  Feed timeout: {}s", config.crawler.rss_timeout_seconds);
    println!("  Scan on startup: {}", config.crawler.scan_on_startup);

    println!("\nSchedule:");
    println!("  Link crawl: every {}h", config.schedule.crawl_interval_hours);
    println!(
        "  Recovery check: every {}h",
        config.schedule.recovery_interval_hours
    );
    println!("  Feed ingest: every {}h", config.schedule.ingest_interval_hours);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nBootstrap Links ({}):", config.links.len());
    for link in &config.links {
        println!("  - {} <{}>", link.name, link.url);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use friend_crawler::output::{load_statistics, print_statistics};
    use friend_crawler::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    // Open the database
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    // Load statistics
    let stats = load_statistics(&storage)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the default mode: runs the scheduler until interrupted
async fn handle_daemon(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting daemon with {} bootstrap links, database {}",
        config.links.len(),
        config.output.database_path
    );

    match run_daemon(config).await {
        Ok(()) => {
            tracing::info!("Scheduler stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Daemon failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_once() {
        let cli = Cli::parse_from(["friend-crawler", "config.toml", "--once", "recover"]);
        assert_eq!(cli.once, Some(OnceJob::Recover));
        assert_eq!(Job::from(OnceJob::Recover), Job::Recovery);
    }

    #[test]
    fn test_once_conflicts_with_stats() {
        let result = Cli::try_parse_from(["friend-crawler", "config.toml", "--once", "crawl", "--stats"]);
        assert!(result.is_err());
    }
}
