//! Calibration outcome classification.

use crate::core::types::CalibrationStatus;

/// Evidence gathered from a calibration run directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationEvidence<'a> {
    /// Entry-point log missing: calibration never started.
    NotStarted,
    /// Entry-point log present, completion log missing.
    Incomplete,
    /// Completion log could not be read.
    Unreadable,
    /// Completion log contents.
    Completed(&'a str),
}

/// Classify calibration evidence.
///
/// Only the last `tail_lines` lines of the completion log are searched for
/// `marker`; earlier occurrences belong to previous attempts and are ignored.
pub fn classify(
    evidence: CalibrationEvidence<'_>,
    marker: &str,
    tail_lines: usize,
) -> CalibrationStatus {
    match evidence {
        CalibrationEvidence::NotStarted => CalibrationStatus::NotApplicable,
        CalibrationEvidence::Incomplete | CalibrationEvidence::Unreadable => CalibrationStatus::Failed,
        CalibrationEvidence::Completed(log) => {
            if tail_contains(log, marker, tail_lines) {
                CalibrationStatus::Successful
            } else {
                CalibrationStatus::Failed
            }
        }
    }
}

/// True if any of the last `tail_lines` lines of `text` contains `marker`.
pub fn tail_contains(text: &str, marker: &str, tail_lines: usize) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(tail_lines);
    lines[start..].iter().any(|line| line.contains(marker))
}
