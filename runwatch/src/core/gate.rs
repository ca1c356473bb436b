//! Fail-fast gate applied between evaluation and rendering.

use crate::core::types::{CalibrationStatus, RunEvaluation};

/// Result of gating a set of evaluated runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Nothing blocks publishing.
    Proceed,
    /// Named calibration runs failed; the pass must abort without a report.
    CriticalFailure { failed_runs: Vec<String> },
}

/// Block the pass when any calibration run reports `Failed`.
pub fn gate(evaluations: &[RunEvaluation]) -> GateDecision {
    let failed_runs: Vec<String> = evaluations
        .iter()
        .filter(|eval| eval.calibration == CalibrationStatus::Failed)
        .map(|eval| eval.name.clone())
        .collect();
    if failed_runs.is_empty() {
        GateDecision::Proceed
    } else {
        GateDecision::CriticalFailure { failed_runs }
    }
}
