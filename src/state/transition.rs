//! Link state machine
//!
//! Computes the next persisted state of a link from its current record and the
//! result of one probe. Persistence is left to the storage layer.

use crate::crawler::ProbeResult;
use crate::state::LinkStatus;
use crate::storage::LinkRecord;

/// Number of consecutive failed probes after which a link is considered dead
pub const DEATH_THRESHOLD: u32 = 4;

/// Advances a link by one probe
///
/// # Rules
///
/// | Probe status | failure_count | is_died |
/// |--------------|---------------|---------|
/// | survival     | reset to 0    | false   |
/// | otherwise    | +1            | true once count >= 4, else unchanged |
///
/// The link's `status` always becomes the literal probe status, a non-empty
/// redirect target replaces the URL, and description/icon are only filled in
/// when the stored value is empty.
pub fn advance(link: &LinkRecord, probe: &ProbeResult) -> LinkRecord {
    debug_assert!(probe.status.is_probe_outcome());
    let mut next = link.clone();

    if probe.status.is_survival() {
        next.failure_count = 0;
        next.is_died = false;
    } else {
        next.failure_count = link.failure_count.saturating_add(1);
    }

    if next.failure_count >= DEATH_THRESHOLD {
        next.is_died = true;
    }

    next.status = probe.status;

    if let Some(redirect) = probe.redirect_url.as_deref().filter(|r| !r.is_empty()) {
        next.url = redirect.to_string();
    }

    if next.description.is_empty() && !probe.description.is_empty() {
        next.description = probe.description.clone();
    }

    if next.icon.is_empty() && !probe.icon_url.is_empty() {
        next.icon = probe.icon_url.clone();
    }

    next
}

/// Returns true if a probe outcome should be treated as a failure
pub fn is_failure(status: LinkStatus) -> bool {
    !status.is_survival()
}
