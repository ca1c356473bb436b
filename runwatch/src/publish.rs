//! Publishing a rendered report into a git working copy.
//!
//! The report file is fully overwritten, staged, and committed only when git
//! sees a staged change for it. A push is attempted only after a successful
//! commit. Git failures are recorded in the [`PublishResult`] and the publish
//! log rather than returned as errors; only a missing repository or an
//! unwritable report file abort the publish step. A missing repository is
//! still recorded in the publish log when its directory exists.

use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::core::types::PublishResult;
use crate::error::{MonitorError, Result};
use crate::io::git::{Vcs, is_repository_root};
use crate::io::publish_log::PublishLog;

/// What to publish and where.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    pub repo_path: &'a Path,
    /// Report location relative to `repo_path`.
    pub report_file: &'a Path,
    pub content: &'a str,
    pub commit_message: &'a str,
    pub remote: Option<&'a str>,
}

/// Write, stage, commit and push a report.
#[instrument(skip_all, fields(report = %request.report_file.display()))]
pub fn publish_report<V: Vcs>(
    vcs: &V,
    log: &PublishLog,
    request: &PublishRequest<'_>,
) -> Result<PublishResult> {
    if !is_repository_root(request.repo_path) {
        warn!(repo = %request.repo_path.display(), "not a git repository");
        let err = MonitorError::NotARepository {
            path: request.repo_path.to_path_buf(),
        };
        // Never create the target directory just to hold the log.
        if request.repo_path.is_dir() {
            log.record(&format!("Error: {err}."));
        }
        return Err(err);
    }

    let report_path = request.repo_path.join(request.report_file);
    write_report(&report_path, request.content)?;
    debug!(path = %report_path.display(), "report written");

    let file = request.report_file;
    let mut result = PublishResult::default();

    log.record(&format!("Staging {}...", file.display()));
    if let Err(err) = vcs.stage(file).map(|out| log.record_success(&out)) {
        return Ok(fail(result, log, err));
    }

    match vcs.has_staged_changes(file) {
        Ok(true) => result.changed = true,
        Ok(false) => {
            log.record("Nothing to commit.");
            info!("report unchanged, nothing to publish");
            return Ok(result);
        }
        Err(err) => return Ok(fail(result, log, err)),
    }

    log.record("Committing changes...");
    match vcs.commit(file, request.commit_message) {
        Ok(out) => {
            log.record_success(&out);
            result.committed = true;
        }
        Err(err) => return Ok(fail(result, log, err)),
    }

    match request.remote {
        Some(remote) => log.record(&format!("Pushing to {remote}...")),
        None => log.record("Pushing to upstream..."),
    }
    match vcs.push(request.remote) {
        Ok(out) => {
            log.record_success(&out);
            result.pushed = true;
        }
        // The local commit stays; the next pass pushes it along with its own.
        Err(err) => return Ok(fail(result, log, err)),
    }

    log.record(&format!(
        "Successfully committed and pushed {}.",
        file.display()
    ));
    info!("report committed and pushed");
    Ok(result)
}

fn fail(mut result: PublishResult, log: &PublishLog, err: MonitorError) -> PublishResult {
    warn!(%err, "publish step failed");
    log.record_failure(&err);
    result.error = Some(err.to_string());
    result
}

/// Replace the report atomically (temp file + rename).
fn write_report(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MonitorError::io("create directory", parent, e))?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents).map_err(|e| MonitorError::io("write report", &tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| MonitorError::io("replace report", path, e))
}
