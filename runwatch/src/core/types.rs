//! Shared deterministic types for run evaluation and health reporting.
//!
//! These are pass-scoped value objects: built once per invocation, never
//! mutated, discarded after rendering.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::NaiveDateTime;

/// Snapshot of one run directory taken while listing the run root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    pub path: PathBuf,
    pub name: String,
    pub created: SystemTime,
    pub modified: SystemTime,
}

/// Whether a run reached normal completion (sentinel artifact present).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Successful,
    Failed,
}

impl CompletionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of the calibration sub-step.
///
/// `NotApplicable` is a calibration run whose calibration never started;
/// `NotCalibrationRun` is any run outside the calibration naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    Successful,
    Failed,
    NotApplicable,
    NotCalibrationRun,
}

impl CalibrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Successful => "Successful",
            Self::Failed => "Failed",
            Self::NotApplicable => "N/A",
            Self::NotCalibrationRun => "-",
        }
    }
}

/// Verdict for a single run directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RunEvaluation {
    pub name: String,
    pub status: CompletionStatus,
    /// Minutes between creation and last modification, rounded to 2 decimals.
    pub duration_minutes: f64,
    pub calibration: CalibrationStatus,
    pub has_plots: bool,
    pub has_reporting: bool,
}

/// Classified remote health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthVerdict {
    pub ok: bool,
    pub message: String,
    pub checked_at: NaiveDateTime,
}

/// What the publisher did with a rendered report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishResult {
    /// The staged report differed from the committed one.
    pub changed: bool,
    pub committed: bool,
    pub pushed: bool,
    pub error: Option<String>,
}

impl PublishResult {
    /// True when nothing went wrong (including the no-change case).
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
