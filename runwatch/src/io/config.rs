//! Monitor configuration stored in `runwatch.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::health::HealthRules;

/// Monitor configuration (TOML).
///
/// Intended to be edited by humans. Missing sections and fields fall back to
/// the values the daily model runs have always used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MonitorConfig {
    pub runs: RunsConfig,
    pub calibration: CalibrationConfig,
    pub health: HealthConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunsConfig {
    /// Directory whose immediate subdirectories are individual runs.
    pub root_dir: PathBuf,
    /// How many of the most recent runs to report.
    pub limit: usize,
    /// File whose presence marks normal completion of a run.
    pub sentinel_file: String,
    pub plot_file: String,
    pub reporting_file: String,
    pub report_title: String,
    /// Report path relative to `publish.repo_path`.
    pub report_file: PathBuf,
    /// `{date}` expands to the pass date.
    pub commit_message: String,
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("runs"),
            limit: 4,
            sentinel_file: "blabla.gdx".to_string(),
            plot_file: "plots.pdf".to_string(),
            reporting_file: "reporting.mif".to_string(),
            report_title: "Daily Run Report".to_string(),
            report_file: PathBuf::from("README.md"),
            commit_message: "Update daily run report".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Runs whose directory name starts with this prefix are calibration runs.
    pub name_prefix: String,
    /// Written when the calibration stage starts.
    pub entry_log: String,
    /// Written by the calibration solver; its tail carries the marker.
    pub completion_log: String,
    pub marker: String,
    /// Number of trailing completion-log lines searched for the marker.
    pub tail_lines: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            name_prefix: "DAILY_NPi_".to_string(),
            entry_log: "calibration.log".to_string(),
            completion_log: "calibration_solve.log".to_string(),
            marker: "*** Status: Normal completion".to_string(),
            tail_lines: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HealthConfig {
    /// Log appended to by the external remote-probe script.
    pub log_path: PathBuf,
    pub stale_minutes: u64,
    pub status_prefix: String,
    pub ok_payload: String,
    pub ok_message: String,
    /// Status file path relative to `publish.repo_path`.
    pub report_file: PathBuf,
    pub commit_message: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("remote-health.log"),
            stale_minutes: 90,
            status_prefix: "STATUS:".to_string(),
            ok_payload: "OK".to_string(),
            ok_message: "Remote server accessible".to_string(),
            report_file: PathBuf::from("remote_server_status.txt"),
            commit_message: "Update remote server accessibility status".to_string(),
        }
    }
}

impl HealthConfig {
    pub fn rules(&self) -> HealthRules<'_> {
        HealthRules {
            stale_after: Duration::from_secs(self.stale_minutes.saturating_mul(60)),
            status_prefix: &self.status_prefix,
            ok_payload: &self.ok_payload,
            ok_message: &self.ok_message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PublishConfig {
    /// Working copy the reports are committed into.
    pub repo_path: PathBuf,
    /// Remote to push to; unset pushes to the current branch's upstream.
    pub remote: Option<String>,
    /// Append-only publish log, relative to `repo_path` unless absolute.
    pub log_file: PathBuf,
    /// Wall-clock limit for each git command.
    pub command_timeout_secs: u64,
    /// Truncate captured git stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            remote: None,
            log_file: PathBuf::from("git_log.txt"),
            command_timeout_secs: 120,
            output_limit_bytes: 100_000,
        }
    }
}

impl PublishConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn log_path(&self) -> PathBuf {
        self.repo_path.join(&self.log_file)
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.runs.limit == 0 {
            return Err(anyhow!("runs.limit must be > 0"));
        }
        for (key, value) in [
            ("runs.sentinel_file", &self.runs.sentinel_file),
            ("runs.plot_file", &self.runs.plot_file),
            ("runs.reporting_file", &self.runs.reporting_file),
            ("calibration.name_prefix", &self.calibration.name_prefix),
            ("calibration.entry_log", &self.calibration.entry_log),
            ("calibration.completion_log", &self.calibration.completion_log),
            ("calibration.marker", &self.calibration.marker),
            ("health.status_prefix", &self.health.status_prefix),
            ("health.ok_payload", &self.health.ok_payload),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{key} must be non-empty"));
            }
        }
        if self.runs.report_file.as_os_str().is_empty() {
            return Err(anyhow!("runs.report_file must be non-empty"));
        }
        if self.health.report_file.as_os_str().is_empty() {
            return Err(anyhow!("health.report_file must be non-empty"));
        }
        if self.calibration.tail_lines == 0 {
            return Err(anyhow!("calibration.tail_lines must be > 0"));
        }
        if self.health.stale_minutes == 0 {
            return Err(anyhow!("health.stale_minutes must be > 0"));
        }
        if self.publish.command_timeout_secs == 0 {
            return Err(anyhow!("publish.command_timeout_secs must be > 0"));
        }
        if self.publish.output_limit_bytes == 0 {
            return Err(anyhow!("publish.output_limit_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MonitorConfig::default()`.
pub fn load_config(path: &Path) -> Result<MonitorConfig> {
    if !path.exists() {
        let cfg = MonitorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MonitorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MonitorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
