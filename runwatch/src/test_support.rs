//! Test-only helpers: scratch git repositories, run directory builders and a
//! scripted [`Vcs`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use crate::error::{MonitorError, Result as MonitorResult};
use crate::io::config::MonitorConfig;
use crate::io::git::{Git, GitOutput, Vcs};

/// Deterministic pass time used across tests.
pub fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(6, 30, 0))
        .expect("valid fixed time")
}

/// Write `contents` to `path` and backdate its mtime by `age`.
pub fn write_with_age(path: &Path, contents: &str, age: Duration) {
    fs::write(path, contents).expect("write file");
    set_age(path, age);
}

/// Backdate the mtime of an existing file or directory by `age`.
pub fn set_age(path: &Path, age: Duration) {
    let file = fs::File::options()
        .write(!path.is_dir())
        .read(path.is_dir())
        .open(path)
        .expect("open for set_modified");
    file.set_modified(SystemTime::now() - age)
        .expect("set modified time");
}

/// A completion log whose tail carries `marker`.
pub fn completion_log_with_marker(marker: &str) -> String {
    let mut lines: Vec<String> = (1..=30).map(|i| format!("iteration {i}: residual ok")).collect();
    lines.push(marker.to_string());
    lines.push("--- job finished".to_string());
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Builder for one run directory with a set of files.
#[derive(Debug, Clone)]
pub struct RunDirBuilder {
    dir: PathBuf,
    files: Vec<(String, String)>,
}

impl RunDirBuilder {
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            dir: root.join(name),
            files: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, contents: &str) -> Self {
        self.files.push((name.to_string(), contents.to_string()));
        self
    }

    pub fn create(self) -> PathBuf {
        fs::create_dir_all(&self.dir).expect("create run dir");
        for (name, contents) in &self.files {
            fs::write(self.dir.join(name), contents).expect("write run file");
        }
        self.dir
    }
}

/// A git working copy with a bare `origin`, both inside one temp dir.
pub struct TestRepo {
    _temp: TempDir,
    root: PathBuf,
    remote: PathBuf,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("tempdir")?;
        let root = temp.path().join("work");
        let remote = temp.path().join("origin.git");
        fs::create_dir_all(&root).context("create work dir")?;
        fs::create_dir_all(&remote).context("create remote dir")?;

        git(&remote, &["init", "--bare", "--quiet"])?;
        git(&root, &["init", "--quiet"])?;
        git(&root, &["config", "user.name", "Runwatch Test"])?;
        git(&root, &["config", "user.email", "runwatch-test@local.invalid"])?;
        git(&root, &["config", "commit.gpgsign", "false"])?;
        git(&root, &["commit", "--allow-empty", "--quiet", "-m", "initial"])?;
        let remote_arg = remote.to_string_lossy().into_owned();
        git(&root, &["remote", "add", "origin", &remote_arg])?;
        git(&root, &["push", "--quiet", "-u", "origin", "HEAD"])?;

        Ok(Self {
            _temp: temp,
            root,
            remote,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Real git adapter bound to this working copy.
    pub fn git(&self) -> Git {
        Git::new(&self.root, Duration::from_secs(60), 100_000)
    }

    pub fn head_sha(&self) -> String {
        git(&self.root, &["rev-parse", "HEAD"]).expect("rev-parse")
    }

    pub fn last_commit_message(&self) -> String {
        git(&self.root, &["log", "-1", "--pretty=%s"]).expect("git log")
    }

    pub fn commit_count(&self) -> usize {
        git(&self.root, &["rev-list", "--count", "HEAD"])
            .expect("rev-list")
            .parse()
            .expect("count")
    }

    /// Subject of the remote's copy of the current branch.
    pub fn remote_head_message(&self) -> String {
        let branch = git(&self.root, &["rev-parse", "--abbrev-ref", "HEAD"]).expect("branch");
        git(&self.remote, &["log", "-1", "--pretty=%s", &branch]).expect("remote log")
    }

    /// Config with every path pointing into this repo and `runs_root`.
    pub fn config(&self, runs_root: &Path, health_log: &Path) -> MonitorConfig {
        let mut cfg = MonitorConfig::default();
        cfg.runs.root_dir = runs_root.to_path_buf();
        cfg.health.log_path = health_log.to_path_buf();
        cfg.publish.repo_path = self.root.clone();
        cfg.publish.remote = Some("origin".to_string());
        cfg
    }
}

fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !out.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}

/// [`Vcs`] double with queued `has_staged_changes` answers and injectable
/// commit/push failures. Records the operations it was asked to perform.
pub struct ScriptedVcs {
    staged: RefCell<VecDeque<bool>>,
    fail_commit: bool,
    fail_push: bool,
    calls: RefCell<Vec<&'static str>>,
}

impl ScriptedVcs {
    pub fn new(staged: Vec<bool>) -> Self {
        Self {
            staged: RefCell::new(staged.into()),
            fail_commit: false,
            fail_push: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    fn ok(&self, call: &'static str, command: String) -> MonitorResult<GitOutput> {
        self.calls.borrow_mut().push(call);
        Ok(GitOutput {
            command,
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn failed(&self, call: &'static str, command: String) -> MonitorResult<GitOutput> {
        self.calls.borrow_mut().push(call);
        Err(MonitorError::ExternalProcess {
            command,
            code: Some(1),
            stdout: String::new(),
            stderr: format!("scripted {call} failure"),
        })
    }
}

impl Vcs for ScriptedVcs {
    fn stage(&self, path: &Path) -> MonitorResult<GitOutput> {
        self.ok("stage", format!("git add -- {}", path.display()))
    }

    fn has_staged_changes(&self, path: &Path) -> MonitorResult<bool> {
        self.calls.borrow_mut().push("diff");
        self.staged
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| MonitorError::ExternalProcess {
                command: format!("git diff --cached --name-only -- {}", path.display()),
                code: None,
                stdout: String::new(),
                stderr: "no scripted diff answer left".to_string(),
            })
    }

    fn commit(&self, path: &Path, message: &str) -> MonitorResult<GitOutput> {
        let command = format!("git commit -m {message} -- {}", path.display());
        if self.fail_commit {
            self.failed("commit", command)
        } else {
            self.ok("commit", command)
        }
    }

    fn push(&self, remote: Option<&str>) -> MonitorResult<GitOutput> {
        let command = match remote {
            Some(remote) => format!("git push {remote}"),
            None => "git push".to_string(),
        };
        if self.fail_push {
            self.failed("push", command)
        } else {
            self.ok("push", command)
        }
    }
}
