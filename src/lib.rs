//! Friend-Crawler: liveness prober and feed ingestor for friend links
//!
//! This crate periodically probes a directory of externally maintained
//! "friend" websites, tracks their liveness through a small state machine,
//! discovers their RSS/Atom feeds and ingests new articles into SQLite.

pub mod config;
pub mod crawler;
pub mod feed;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Friend-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Feed error: {0}")]
    Feed(#[from] feed::FeedError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Friend-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{probe, run_concurrently, ProbeResult};
pub use state::{advance, FeedStatus, LinkStatus};
