//! Run directory listing and per-run evaluation.

use std::fs::{self, Metadata};
use std::path::Path;
use std::time::SystemTime;

use tracing::{debug, instrument, warn};

use crate::core::calibration::{CalibrationEvidence, classify};
use crate::core::selection::{duration_minutes, most_recent};
use crate::core::types::{CalibrationStatus, CompletionStatus, RunDirectory, RunEvaluation};
use crate::error::{MonitorError, Result};
use crate::io::config::{CalibrationConfig, RunsConfig};

/// Calibration verdict plus the read error that forced it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationCheck {
    pub status: CalibrationStatus,
    pub diagnostic: Option<String>,
}

/// List immediate subdirectories of `root` and keep the `limit` newest.
#[instrument(skip_all, fields(root = %root.display(), limit = limit))]
pub fn select_runs(root: &Path, limit: usize) -> Result<Vec<RunDirectory>> {
    if !root.is_dir() {
        return Err(MonitorError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    let entries = fs::read_dir(root).map_err(|e| MonitorError::io("read directory", root, e))?;
    let mut runs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| MonitorError::io("read directory entry", root, e))?;
        let path = entry.path();
        // Dangling links and runs removed mid-listing are skipped, not fatal.
        let (meta, modified) = match fs::metadata(&path).and_then(|m| {
            let modified = m.modified()?;
            Ok((m, modified))
        }) {
            Ok(found) => found,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable run entry");
                continue;
            }
        };
        if !meta.is_dir() {
            continue;
        }
        runs.push(RunDirectory {
            name: entry.file_name().to_string_lossy().into_owned(),
            created: creation_time(&meta, modified),
            modified,
            path,
        });
    }
    debug!(candidates = runs.len(), "listed run directories");
    Ok(most_recent(runs, limit))
}

/// Birth time where the filesystem reports one, else the inode change time.
fn creation_time(meta: &Metadata, modified: SystemTime) -> SystemTime {
    if let Ok(created) = meta.created() {
        return created;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        use std::time::Duration;

        let secs = meta.ctime();
        let nanos = u32::try_from(meta.ctime_nsec()).unwrap_or(0);
        if let Ok(secs) = u64::try_from(secs) {
            return SystemTime::UNIX_EPOCH + Duration::new(secs, nanos);
        }
    }
    modified
}

/// Derive the verdict for one run directory.
#[instrument(skip_all, fields(run = %run.name))]
pub fn evaluate_run(
    run: &RunDirectory,
    runs: &RunsConfig,
    calibration: &CalibrationConfig,
) -> RunEvaluation {
    let status = if run.path.join(&runs.sentinel_file).is_file() {
        CompletionStatus::Successful
    } else {
        CompletionStatus::Failed
    };

    let calibration = if run.name.starts_with(&calibration.name_prefix) {
        let check = check_calibration(&run.path, calibration);
        if let Some(diagnostic) = &check.diagnostic {
            warn!(%diagnostic, "calibration log unreadable, treating as failed");
        }
        check.status
    } else {
        CalibrationStatus::NotCalibrationRun
    };

    let eval = RunEvaluation {
        name: run.name.clone(),
        status,
        duration_minutes: duration_minutes(run.created, run.modified),
        calibration,
        has_plots: run.path.join(&runs.plot_file).is_file(),
        has_reporting: run.path.join(&runs.reporting_file).is_file(),
    };
    debug!(
        status = %eval.status,
        calibration = %eval.calibration,
        duration_minutes = eval.duration_minutes,
        "run evaluated"
    );
    eval
}

/// Classify the calibration stage of a run directory.
///
/// Read failures are folded into `Failed` and reported via `diagnostic`.
pub fn check_calibration(run_dir: &Path, cfg: &CalibrationConfig) -> CalibrationCheck {
    let marker = cfg.marker.as_str();
    if !run_dir.join(&cfg.entry_log).exists() {
        return CalibrationCheck {
            status: classify(CalibrationEvidence::NotStarted, marker, cfg.tail_lines),
            diagnostic: None,
        };
    }
    let completion_path = run_dir.join(&cfg.completion_log);
    if !completion_path.exists() {
        return CalibrationCheck {
            status: classify(CalibrationEvidence::Incomplete, marker, cfg.tail_lines),
            diagnostic: None,
        };
    }
    match read_lossy(&completion_path) {
        Ok(contents) => CalibrationCheck {
            status: classify(
                CalibrationEvidence::Completed(&contents),
                marker,
                cfg.tail_lines,
            ),
            diagnostic: None,
        },
        Err(err) => CalibrationCheck {
            status: classify(CalibrationEvidence::Unreadable, marker, cfg.tail_lines),
            diagnostic: Some(err.to_string()),
        },
    }
}

/// Read a log file, replacing invalid UTF-8 instead of failing on it.
pub fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| MonitorError::LogRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
