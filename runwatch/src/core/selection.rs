//! Recency ordering of run directories.

use std::time::SystemTime;

use crate::core::types::RunDirectory;

/// Keep the `limit` most recently created runs, newest first.
///
/// Ties on creation time fall back to name order so the output is stable.
/// Fewer than `limit` candidates are returned as-is (no padding).
pub fn most_recent(mut runs: Vec<RunDirectory>, limit: usize) -> Vec<RunDirectory> {
    runs.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.name.cmp(&b.name)));
    runs.truncate(limit);
    runs
}

/// `(modified - created)` in minutes, rounded to 2 decimals.
///
/// Negative when the filesystem clock puts `modified` before `created`.
pub fn duration_minutes(created: SystemTime, modified: SystemTime) -> f64 {
    let secs = match modified.duration_since(created) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        Err(err) => -err.duration().as_secs_f64(),
    };
    round2(secs / 60.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
