//! Output module for reporting on the link database
//!
//! This module handles:
//! - Loading link, feed and article counts from storage
//! - Printing them for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
