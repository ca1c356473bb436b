//! Append-only publish log.
//!
//! Every git operation performed while publishing is recorded here with a
//! timestamp, independently of `RUST_LOG`, so the history survives crashes.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::warn;

use crate::core::render::TIMESTAMP_FORMAT;
use crate::error::{MonitorError, Result};
use crate::io::git::GitOutput;

/// Source of entry timestamps.
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug, Clone)]
pub struct PublishLog {
    path: PathBuf,
    clock: Clock,
}

impl PublishLog {
    /// Entries are stamped with the local wall-clock time of each append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, local_now)
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Clock) -> Self {
        Self {
            path: path.into(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line; multi-line messages are indented.
    pub fn append(&self, message: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| MonitorError::io("create directory", parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MonitorError::io("open publish log", &self.path, e))?;
        let entry = format_entry((self.clock)(), message);
        file.write_all(entry.as_bytes())
            .map_err(|e| MonitorError::io("append publish log", &self.path, e))
    }

    /// Append, downgrading failures to a warning: the publish must not fail
    /// because its log could not be written.
    pub fn record(&self, message: &str) {
        if let Err(err) = self.append(message) {
            warn!(%err, "failed to write publish log");
        }
    }

    pub fn record_success(&self, output: &GitOutput) {
        self.record(&format!(
            "{} succeeded\nSTDOUT: {}\nSTDERR: {}",
            output.command,
            output.stdout.trim(),
            output.stderr.trim()
        ));
    }

    pub fn record_failure(&self, err: &MonitorError) {
        match err {
            MonitorError::ExternalProcess {
                stdout, stderr, ..
            } => self.record(&format!(
                "Git error: {err}\nSTDOUT: {}\nSTDERR: {}",
                stdout.trim(),
                stderr.trim()
            )),
            other => self.record(&format!("Git error: {other}")),
        }
    }
}

fn format_entry(timestamp: NaiveDateTime, message: &str) -> String {
    let mut entry = format!("[{}] ", timestamp.format(TIMESTAMP_FORMAT));
    for (i, line) in message.lines().enumerate() {
        if i > 0 {
            entry.push_str("    ");
        }
        entry.push_str(line);
        entry.push('\n');
    }
    if message.is_empty() {
        entry.push('\n');
    }
    entry
}
