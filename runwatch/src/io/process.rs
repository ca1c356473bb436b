//! Helpers for running child processes with timeouts and bounded output.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::error::{MonitorError, Result};

/// Captured child process output.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run `cmd` to completion or until `timeout`, whichever comes first.
///
/// Both pipes are drained on background threads while the child runs, so a
/// chatty git hook can never block on a full pipe. At most
/// `output_limit_bytes` per stream are kept; the rest is counted and dropped.
/// `label` names the command in errors. Failing to spawn, wait or kill the
/// child surfaces as [`MonitorError::ExternalProcess`] without an exit code.
#[instrument(skip_all, fields(label = %label, timeout_secs = timeout.as_secs()))]
pub fn run_command_with_timeout(
    mut cmd: Command,
    label: &str,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|e| {
        error!(err = %e, "failed to spawn command");
        launch_error(label, "spawn", e)
    })?;
    debug!(pid = child.id(), "child process started");

    let stdout = Drain::start(child.stdout.take(), output_limit_bytes);
    let stderr = Drain::start(child.stderr.take(), output_limit_bytes);

    let (status, timed_out) = match child
        .wait_timeout(timeout)
        .map_err(|e| launch_error(label, "wait", e))?
    {
        Some(status) => (status, false),
        None => {
            warn!("command timed out, killing");
            child.kill().map_err(|e| launch_error(label, "kill", e))?;
            let status = child
                .wait()
                .map_err(|e| launch_error(label, "wait after kill", e))?;
            (status, true)
        }
    };

    let (stdout, stdout_truncated) = stdout
        .finish()
        .map_err(|e| launch_error(label, "read stdout", e))?;
    let (stderr, stderr_truncated) = stderr
        .finish()
        .map_err(|e| launch_error(label, "read stderr", e))?;
    if stdout_truncated + stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn launch_error(label: &str, action: &str, err: io::Error) -> MonitorError {
    MonitorError::ExternalProcess {
        command: label.to_string(),
        code: None,
        stdout: String::new(),
        stderr: format!("{action}: {err}"),
    }
}

/// Background reader for one child pipe.
struct Drain(Option<thread::JoinHandle<io::Result<(Vec<u8>, usize)>>>);

impl Drain {
    fn start<R: Read + Send + 'static>(pipe: Option<R>, limit: usize) -> Self {
        Self(pipe.map(|pipe| thread::spawn(move || read_capped(pipe, limit))))
    }

    /// Kept bytes and the number of bytes dropped past the cap.
    fn finish(self) -> io::Result<(Vec<u8>, usize)> {
        match self.0 {
            None => Err(io::Error::other("pipe was not configured")),
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("output reader thread panicked"))),
        }
    }
}

fn read_capped<R: Read>(mut reader: R, limit: usize) -> io::Result<(Vec<u8>, usize)> {
    let mut kept = Vec::new();
    let mut dropped = 0usize;
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            return Ok((kept, dropped));
        }
        let keep = n.min(limit.saturating_sub(kept.len()));
        kept.extend_from_slice(&chunk[..keep]);
        dropped += n - keep;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_stdout_and_status() {
        let out = run_command_with_timeout(
            sh("echo hello; exit 3"),
            "sh",
            Duration::from_secs(10),
            1024,
        )
        .expect("run");
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stdout_lossy(), "hello\n");
        assert!(!out.timed_out);
    }

    #[test]
    fn truncates_output_beyond_limit() {
        let out =
            run_command_with_timeout(sh("printf 'abcdefghij'"), "sh", Duration::from_secs(10), 4)
                .expect("run");
        assert_eq!(out.stdout, b"abcd");
        assert_eq!(out.stdout_truncated, 6);
    }

    #[test]
    fn kills_command_after_timeout() {
        let out =
            run_command_with_timeout(sh("exec sleep 5"), "sh", Duration::from_millis(200), 1024)
                .expect("run");
        assert!(out.timed_out);
        assert!(!out.status.success());
    }

    #[test]
    fn missing_binary_is_external_process_error() {
        let cmd = Command::new("definitely-not-a-real-binary-runwatch");
        let err =
            run_command_with_timeout(cmd, "missing", Duration::from_secs(1), 1024).unwrap_err();
        assert!(matches!(err, MonitorError::ExternalProcess { code: None, .. }));
    }
}
