//! Git adapter for report publishing.
//!
//! Publishing only ever stages, commits and pushes a single report file, so we
//! keep a small, explicit wrapper around `git` subprocess calls. Every call is
//! bounded by a timeout and reports a typed result.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::error::{MonitorError, Result};
use crate::io::process::run_command_with_timeout;

/// Successful git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    /// Rendered command line, e.g. `git add README.md`.
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

/// The version-control operations publishing needs.
pub trait Vcs {
    /// Stage the current content of `path`.
    fn stage(&self, path: &Path) -> Result<GitOutput>;
    /// True if `path` has staged changes relative to `HEAD`.
    fn has_staged_changes(&self, path: &Path) -> Result<bool>;
    /// Commit only `path` with `message`.
    fn commit(&self, path: &Path, message: &str) -> Result<GitOutput>;
    /// Push the current branch to `remote` (or its upstream when `None`).
    fn push(&self, remote: Option<&str>) -> Result<GitOutput>;
}

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            workdir: workdir.into(),
            timeout,
            output_limit_bytes,
        }
    }

    fn run(&self, args: &[&str]) -> Result<GitOutput> {
        let command = format!("git {}", args.join(" "));
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.workdir);
        let output =
            run_command_with_timeout(cmd, &command, self.timeout, self.output_limit_bytes)?;
        if output.timed_out {
            warn!(%command, "git command timed out");
            return Err(MonitorError::Timeout {
                command,
                timeout_secs: self.timeout.as_secs(),
            });
        }
        let stdout = output.stdout_lossy();
        let stderr = output.stderr_lossy();
        if !output.status.success() {
            warn!(%command, exit_code = ?output.status.code(), "git command failed");
            return Err(MonitorError::ExternalProcess {
                command,
                code: output.status.code(),
                stdout,
                stderr,
            });
        }
        debug!(%command, "git command succeeded");
        Ok(GitOutput {
            command,
            stdout,
            stderr,
        })
    }
}

impl Vcs for Git {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn stage(&self, path: &Path) -> Result<GitOutput> {
        let path = path_arg(path);
        self.run(&["add", "--", &path])
    }

    fn has_staged_changes(&self, path: &Path) -> Result<bool> {
        let path = path_arg(path);
        let out = self.run(&["diff", "--cached", "--name-only", "--", &path])?;
        Ok(!out.stdout.trim().is_empty())
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn commit(&self, path: &Path, message: &str) -> Result<GitOutput> {
        let path = path_arg(path);
        self.run(&["commit", "-m", message, "--", &path])
    }

    #[instrument(skip_all, fields(remote = ?remote))]
    fn push(&self, remote: Option<&str>) -> Result<GitOutput> {
        match remote {
            Some(remote) => self.run(&["push", remote]),
            None => self.run(&["push"]),
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// True if `dir` is the root of a git working copy (`.git` dir or worktree file).
pub fn is_repository_root(dir: &Path) -> bool {
    dir.join(".git").exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestRepo;
    use std::fs;

    fn git(repo: &TestRepo) -> Git {
        Git::new(repo.path(), Duration::from_secs(30), 100_000)
    }

    #[test]
    fn detects_repository_root() {
        let repo = TestRepo::new().expect("repo");
        assert!(is_repository_root(repo.path()));
        let temp = tempfile::tempdir().expect("tempdir");
        assert!(!is_repository_root(temp.path()));
    }

    #[test]
    fn stage_then_detects_staged_change() {
        let repo = TestRepo::new().expect("repo");
        let git = git(&repo);
        fs::write(repo.path().join("README.md"), "hello\n").expect("write");

        assert!(!git.has_staged_changes(Path::new("README.md")).expect("diff"));
        git.stage(Path::new("README.md")).expect("stage");
        assert!(git.has_staged_changes(Path::new("README.md")).expect("diff"));
    }

    #[test]
    fn commit_only_includes_given_path() {
        let repo = TestRepo::new().expect("repo");
        let git = git(&repo);
        fs::write(repo.path().join("README.md"), "report\n").expect("write");
        fs::write(repo.path().join("other.txt"), "other\n").expect("write");
        git.stage(Path::new("README.md")).expect("stage");
        git.stage(Path::new("other.txt")).expect("stage");

        let out = git
            .commit(Path::new("README.md"), "Update daily run report")
            .expect("commit");
        assert_eq!(
            out.command,
            "git commit -m Update daily run report -- README.md"
        );
        assert_eq!(repo.last_commit_message(), "Update daily run report");
        assert!(git.has_staged_changes(Path::new("other.txt")).expect("diff"));
    }

    #[test]
    fn failing_command_carries_exit_code_and_stderr() {
        let repo = TestRepo::new().expect("repo");
        let err = git(&repo).push(Some("no-such-remote")).unwrap_err();
        match err {
            MonitorError::ExternalProcess { code, stderr, .. } => {
                assert!(code.is_some_and(|c| c != 0));
                assert!(!stderr.trim().is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn push_reaches_remote() {
        let repo = TestRepo::new().expect("repo");
        let git = git(&repo);
        fs::write(repo.path().join("README.md"), "pushed\n").expect("write");
        git.stage(Path::new("README.md")).expect("stage");
        git.commit(Path::new("README.md"), "push me").expect("commit");

        git.push(None).expect("push");
        assert_eq!(repo.remote_head_message(), "push me");
    }
}
