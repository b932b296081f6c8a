/// Status definitions for links and feeds
///
/// This module defines the closed set of statuses a link or feed can be in.
/// Values are validated once when read from the database.
use std::fmt;

/// Represents the status of a friend link
///
/// Besides the manual states (`Pending`, `Ignored`), a link carries the literal
/// outcome of its most recent probe. Death is tracked separately by the
/// `is_died` flag on the link record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    // ===== Manual States =====
    /// Link was submitted but never probed
    Pending,

    /// Link is excluded from crawling entirely
    Ignored,

    // ===== Probe Outcomes =====
    /// Site answered with 200 or a redirect
    Survival,

    /// Site could not be reached (connection error or client timeout)
    Timeout,

    /// Site answered with an unexpected status or unparseable HTML
    Error,

    /// Legacy terminal state from databases that encoded death in the status
    Died,
}

impl LinkStatus {
    /// Returns true if this status counts as a successful probe
    pub fn is_survival(&self) -> bool {
        matches!(self, Self::Survival)
    }

    /// Returns true if this status can be produced by a probe
    pub fn is_probe_outcome(&self) -> bool {
        matches!(self, Self::Survival | Self::Timeout | Self::Error)
    }

    /// Converts the link status to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ignored => "ignored",
            Self::Survival => "survival",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Died => "died",
        }
    }

    /// Parses a link status from a database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "ignored" => Some(Self::Ignored),
            "survival" => Some(Self::Survival),
            "timeout" => Some(Self::Timeout),
            "error" => Some(Self::Error),
            "died" => Some(Self::Died),
            _ => None,
        }
    }

    /// Returns all possible link statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Ignored,
            Self::Survival,
            Self::Timeout,
            Self::Error,
            Self::Died,
        ]
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Represents the status of a registered feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedStatus {
    /// Feed is active (set on registration)
    Survival,

    /// Feed could not be reached
    Timeout,

    /// Feed answered with an error
    Error,

    /// Feed is paused manually and skipped by ingestion
    Pause,
}

impl FeedStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Survival => "survival",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::Pause => "pause",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "survival" => Some(Self::Survival),
            "timeout" => Some(Self::Timeout),
            "error" => Some(Self::Error),
            "pause" => Some(Self::Pause),
            _ => None,
        }
    }

    pub fn all_statuses() -> Vec<Self> {
        vec![Self::Survival, Self::Timeout, Self::Error, Self::Pause]
    }
}

impl fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_probe_outcome() {
        assert!(LinkStatus::Survival.is_probe_outcome());
        assert!(LinkStatus::Timeout.is_probe_outcome());
        assert!(LinkStatus::Error.is_probe_outcome());

        assert!(!LinkStatus::Pending.is_probe_outcome());
        assert!(!LinkStatus::Ignored.is_probe_outcome());
        assert!(!LinkStatus::Died.is_probe_outcome());
    }

    #[test]
    fn test_link_status_db_strings() {
        assert_eq!(LinkStatus::Pending.to_db_string(), "pending");
        assert_eq!(LinkStatus::Survival.to_db_string(), "survival");
        assert_eq!(LinkStatus::Died.to_db_string(), "died");
        assert_eq!(
            LinkStatus::from_db_string("timeout"),
            Some(LinkStatus::Timeout)
        );
        assert_eq!(LinkStatus::from_db_string("alive"), None);
        assert_eq!(LinkStatus::from_db_string("Survival"), None);
    }

    #[test]
    fn test_link_status_roundtrip() {
        for status in LinkStatus::all_statuses() {
            assert_eq!(
                LinkStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
    }

    #[test]
    fn test_feed_status_roundtrip() {
        for status in FeedStatus::all_statuses() {
            assert_eq!(
                FeedStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
        assert_eq!(FeedStatus::from_db_string("valid"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", LinkStatus::Ignored), "ignored");
        assert_eq!(format!("{}", FeedStatus::Pause), "pause");
    }
}
