//! Typed error taxonomy for run evaluation and publishing.
//!
//! Evaluation and health checking absorb these into status values; only
//! selection and publishing let them reach the process exit code.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("run root {} does not exist or is not a directory", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("{} is not a git repository", .path.display())]
    NotARepository { path: PathBuf },

    #[error("read log {}: {source}", .path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {}", describe_code(.code), .stderr.trim())]
    ExternalProcess {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MonitorError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (killed by signal)".to_string(),
    }
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_process_message_includes_trimmed_stderr() {
        let err = MonitorError::ExternalProcess {
            command: "git push".to_string(),
            code: Some(128),
            stdout: String::new(),
            stderr: "fatal: no upstream\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`git push` exited with status 128: fatal: no upstream"
        );
    }

    #[test]
    fn signal_termination_has_readable_message() {
        let err = MonitorError::ExternalProcess {
            command: "git commit".to_string(),
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("killed by signal"));
    }
}
