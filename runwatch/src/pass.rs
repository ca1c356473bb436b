//! One reporting pass: the run report or the remote health status.
//!
//! Run report states: `Selecting -> Evaluating -> Gating -> Rendering ->
//! Publishing -> Done`, with `Gating -> CriticalFailure` when a calibration
//! run failed. A critical failure aborts before any file is written so a
//! calibration regression is never masked by a fresh report.

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::core::gate::{GateDecision, gate};
use crate::core::render::{commit_message, render_health_report, render_run_report};
use crate::core::types::{HealthVerdict, PublishResult, RunEvaluation};
use crate::error::Result;
use crate::exit_codes;
use crate::io::config::MonitorConfig;
use crate::io::git::Vcs;
use crate::io::health_log::check_remote_health;
use crate::io::publish_log::PublishLog;
use crate::io::runs::{evaluate_run, select_runs};
use crate::publish::{PublishRequest, publish_report};

/// Orchestrator states, emitted as tracing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Selecting,
    Evaluating,
    Gating,
    Rendering,
    Publishing,
    Done,
    CriticalFailure,
}

impl fmt::Display for PassState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-invocation settings that are not part of the config file.
#[derive(Debug, Clone, Copy)]
pub struct PassOptions {
    /// Pass time: drives report timestamps and health-log age.
    pub now: DateTime<Local>,
    /// Render only; never touch the repository.
    pub dry_run: bool,
}

impl PassOptions {
    fn generated_at(&self) -> NaiveDateTime {
        self.now.naive_local()
    }
}

/// Result of the run-report pass.
#[derive(Debug, Clone, PartialEq)]
pub enum RunsOutcome {
    Published {
        evaluations: Vec<RunEvaluation>,
        publish: PublishResult,
    },
    DryRun {
        evaluations: Vec<RunEvaluation>,
        report: String,
    },
    CriticalFailure {
        evaluations: Vec<RunEvaluation>,
        failed_runs: Vec<String>,
    },
}

impl RunsOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CriticalFailure { .. } => exit_codes::CRITICAL_FAILURE,
            Self::Published { publish, .. } if !publish.succeeded() => exit_codes::PUBLISH_FAILED,
            Self::Published { .. } | Self::DryRun { .. } => exit_codes::OK,
        }
    }

    pub fn evaluations(&self) -> &[RunEvaluation] {
        match self {
            Self::Published { evaluations, .. }
            | Self::DryRun { evaluations, .. }
            | Self::CriticalFailure { evaluations, .. } => evaluations,
        }
    }
}

/// Result of the remote-health pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthOutcome {
    Published {
        verdict: HealthVerdict,
        publish: PublishResult,
    },
    DryRun {
        verdict: HealthVerdict,
        report: String,
    },
}

impl HealthOutcome {
    pub fn verdict(&self) -> &HealthVerdict {
        match self {
            Self::Published { verdict, .. } | Self::DryRun { verdict, .. } => verdict,
        }
    }

    /// An unhealthy verdict outranks a publish failure.
    pub fn exit_code(&self) -> i32 {
        if !self.verdict().ok {
            return exit_codes::UNHEALTHY;
        }
        match self {
            Self::Published { publish, .. } if !publish.succeeded() => exit_codes::PUBLISH_FAILED,
            _ => exit_codes::OK,
        }
    }
}

fn enter(state: PassState) {
    debug!(%state, "pass state");
}

/// Select, evaluate, gate, render and publish the run report.
///
/// Only a missing run root is returned as an error; publish failures are
/// reported through [`RunsOutcome::Published`].
pub fn run_runs_pass<V: Vcs>(
    cfg: &MonitorConfig,
    vcs: &V,
    options: PassOptions,
) -> Result<RunsOutcome> {
    enter(PassState::Selecting);
    let runs = select_runs(&cfg.runs.root_dir, cfg.runs.limit)?;

    enter(PassState::Evaluating);
    let evaluations: Vec<RunEvaluation> = runs
        .iter()
        .map(|run| evaluate_run(run, &cfg.runs, &cfg.calibration))
        .collect();

    enter(PassState::Gating);
    if let GateDecision::CriticalFailure { failed_runs } = gate(&evaluations) {
        enter(PassState::CriticalFailure);
        error!(
            failed_runs = ?failed_runs,
            "calibration failed, aborting before writing the report"
        );
        return Ok(RunsOutcome::CriticalFailure {
            evaluations,
            failed_runs,
        });
    }

    enter(PassState::Rendering);
    let generated_at = options.generated_at();
    let report = render_run_report(&cfg.runs.report_title, generated_at, &evaluations);
    if options.dry_run {
        enter(PassState::Done);
        return Ok(RunsOutcome::DryRun {
            evaluations,
            report,
        });
    }

    enter(PassState::Publishing);
    let message = commit_message(&cfg.runs.commit_message, generated_at);
    let publish = publish(cfg, vcs, &cfg.runs.report_file, &report, &message);
    enter(PassState::Done);
    info!(
        runs = evaluations.len(),
        committed = publish.committed,
        pushed = publish.pushed,
        "run report pass finished"
    );
    Ok(RunsOutcome::Published {
        evaluations,
        publish,
    })
}

/// Check remote health, render the status file and publish it.
///
/// The status file is published whatever the verdict, so consumers of the
/// repository always see the latest state.
pub fn run_health_pass<V: Vcs>(cfg: &MonitorConfig, vcs: &V, options: PassOptions) -> HealthOutcome {
    let generated_at = options.generated_at();
    let verdict = check_remote_health(
        &cfg.health.log_path,
        &cfg.health.rules(),
        SystemTime::from(options.now),
        generated_at,
    );
    if !verdict.ok {
        warn!(message = %verdict.message, "remote server unhealthy");
    }

    let report = render_health_report(&verdict);
    if options.dry_run {
        return HealthOutcome::DryRun { verdict, report };
    }

    let message = commit_message(&cfg.health.commit_message, generated_at);
    let publish = publish(cfg, vcs, &cfg.health.report_file, &report, &message);
    info!(
        ok = verdict.ok,
        committed = publish.committed,
        pushed = publish.pushed,
        "health pass finished"
    );
    HealthOutcome::Published { verdict, publish }
}

/// Publish through the shared publisher, folding fatal publish errors into
/// the result so the caller maps them to an exit code.
fn publish<V: Vcs>(
    cfg: &MonitorConfig,
    vcs: &V,
    report_file: &Path,
    content: &str,
    commit_message: &str,
) -> PublishResult {
    let log = PublishLog::new(cfg.publish.log_path());
    let request = PublishRequest {
        repo_path: &cfg.publish.repo_path,
        report_file,
        content,
        commit_message,
        remote: cfg.publish.remote.as_deref(),
    };
    match publish_report(vcs, &log, &request) {
        Ok(result) => result,
        Err(err) => {
            error!(%err, "publishing failed");
            PublishResult {
                error: Some(err.to_string()),
                ..PublishResult::default()
            }
        }
    }
}
