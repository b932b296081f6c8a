//! State module for tracking link liveness
//!
//! This module provides the status enumerations persisted for links and feeds,
//! and the pure state machine that advances a link after each probe.
//!
//! # Components
//!
//! - `LinkStatus`: Last probe outcome (or manual state) of a friend link
//! - `FeedStatus`: Status of a registered feed
//! - `advance`: Computes a link's next persisted state from a probe result

mod link_status;
mod transition;

// Re-export main types
pub use link_status::{FeedStatus, LinkStatus};
pub use transition::{advance, is_failure, DEATH_THRESHOLD};
