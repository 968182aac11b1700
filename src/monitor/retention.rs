//! Trailing-window retention for hourly history

use chrono::{DateTime, Duration, Utc};

use crate::common::types::HourlyHistoryEntry;

/// Default hourly retention window
pub const HOURLY_RETENTION_HOURS: i64 = 48;

/// Keep entries captured strictly after `now - window`
///
/// Idempotent: pruning an already pruned list with the same `now` returns it
/// unchanged.
pub fn prune_hourly(
    entries: Vec<HourlyHistoryEntry>,
    now: DateTime<Utc>,
    window: Duration,
) -> Vec<HourlyHistoryEntry> {
    let cutoff = now - window;
    entries.into_iter().filter(|e| e.timestamp > cutoff).collect()
}
