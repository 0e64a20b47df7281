//! Small shared utilities.

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock microseconds since the Unix epoch.
///
/// Live sessions use this to stamp ingress; replay never calls it —
/// replayed timestamps come from the journal.
#[must_use]
pub fn current_time_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_micros() as u64)
        .unwrap_or(0)
}
