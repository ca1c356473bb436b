//! CLI tests for `runwatch runs`, `runwatch health` and `runwatch init`.
//!
//! Spawns the binary against a scratch git repository with a bare remote and
//! checks exit codes and the published files.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::time::Duration;

use runwatch::exit_codes;
use runwatch::io::config::{MonitorConfig, load_config, write_config};
use runwatch::test_support::{RunDirBuilder, TestRepo, write_with_age};

struct Env {
    repo: TestRepo,
    dir: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        let repo = TestRepo::new().expect("repo");
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("runs")).expect("runs dir");
        Self { repo, dir }
    }

    fn runs_root(&self) -> std::path::PathBuf {
        self.dir.path().join("runs")
    }

    fn config(&self) -> MonitorConfig {
        self.repo
            .config(&self.runs_root(), &self.dir.path().join("remote-health.log"))
    }

    fn run(&self, cfg: &MonitorConfig, args: &[&str]) -> Output {
        let config_path = self.dir.path().join("runwatch.toml");
        write_config(&config_path, cfg).expect("write config");
        Command::new(env!("CARGO_BIN_EXE_runwatch"))
            .current_dir(self.dir.path())
            .arg("--config")
            .arg(&config_path)
            .args(args)
            .output()
            .expect("spawn runwatch")
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

#[test]
fn runs_publishes_report_and_exits_ok() {
    let env = Env::new();
    let cfg = env.config();
    RunDirBuilder::new(&env.runs_root(), "A")
        .file(&cfg.runs.sentinel_file, "gdx")
        .file(&cfg.runs.reporting_file, "mif")
        .create();

    let out = env.run(&cfg, &["runs"]);

    assert_eq!(out.status.code(), Some(exit_codes::OK), "{out:?}");
    let report = read(&env.repo.path().join("README.md"));
    assert!(report.contains("| A | successful | "));
    assert!(report.contains(" | - | No | Yes |\n"));
    assert_eq!(env.repo.remote_head_message(), "Update daily run report");
    let log = read(&env.repo.path().join("git_log.txt"));
    assert!(log.contains("Successfully committed and pushed README.md."));
}

#[test]
fn each_pass_refreshes_the_report() {
    let env = Env::new();
    let cfg = env.config();
    RunDirBuilder::new(&env.runs_root(), "A").create();

    let first = env.run(&cfg, &["runs"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK), "{first:?}");
    let commits = env.repo.commit_count();

    // The report embeds a seconds-resolution timestamp.
    std::thread::sleep(Duration::from_millis(1100));
    let second = env.run(&cfg, &["runs"]);
    assert_eq!(second.status.code(), Some(exit_codes::OK), "{second:?}");
    assert_eq!(env.repo.commit_count(), commits + 1);

    let report = read(&env.repo.path().join("README.md"));
    assert!(report.contains("| A | failed | "));
}

#[test]
fn failed_calibration_exits_critical_without_report() {
    let env = Env::new();
    let cfg = env.config();
    RunDirBuilder::new(&env.runs_root(), "DAILY_NPi_B")
        .file(&cfg.calibration.entry_log, "started")
        .file(&cfg.calibration.completion_log, "solver aborted\n")
        .create();

    let out = env.run(&cfg, &["runs"]);

    assert_eq!(out.status.code(), Some(exit_codes::CRITICAL_FAILURE));
    assert!(String::from_utf8_lossy(&out.stderr).contains("DAILY_NPi_B"));
    assert!(!env.repo.path().join("README.md").exists());
    assert_eq!(env.repo.commit_count(), 1);
}

#[test]
fn missing_run_root_exits_invalid() {
    let env = Env::new();
    let cfg = env.config();
    let missing = env.dir.path().join("nope");

    let out = env.run(&cfg, &["runs", "--root", &missing.to_string_lossy()]);

    assert_eq!(out.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&out.stderr).contains("does not exist or is not a directory"));
}

#[test]
fn runs_into_non_repository_exits_publish_failed() {
    let env = Env::new();
    let cfg = env.config();
    RunDirBuilder::new(&env.runs_root(), "A").create();
    let plain = tempfile::tempdir().expect("tempdir");

    let out = env.run(&cfg, &["runs", "--repo", &plain.path().to_string_lossy()]);

    assert_eq!(out.status.code(), Some(exit_codes::PUBLISH_FAILED));
    assert!(!plain.path().join("README.md").exists());
    let log = read(&plain.path().join("git_log.txt"));
    assert!(log.contains("is not a git repository."));
}

#[test]
fn dry_run_prints_report_and_leaves_repo_alone() {
    let env = Env::new();
    let cfg = env.config();
    RunDirBuilder::new(&env.runs_root(), "A").create();

    let out = env.run(&cfg, &["runs", "--dry-run"]);

    assert_eq!(out.status.code(), Some(exit_codes::OK));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("# Daily Run Report\n"));
    assert!(!env.repo.path().join("README.md").exists());
}

#[test]
fn fresh_health_log_exits_ok() {
    let env = Env::new();
    let cfg = env.config();
    write_with_age(
        &cfg.health.log_path,
        "STATUS: OK\n",
        Duration::from_secs(5 * 60),
    );

    let out = env.run(&cfg, &["health"]);

    assert_eq!(out.status.code(), Some(exit_codes::OK), "{out:?}");
    let status = read(&env.repo.path().join("remote_server_status.txt"));
    assert!(status.contains("Status    : OK\n"));
    assert_eq!(
        env.repo.remote_head_message(),
        "Update remote server accessibility status"
    );
}

#[test]
fn stale_health_log_exits_unhealthy_but_publishes() {
    let env = Env::new();
    let cfg = env.config();
    write_with_age(
        &cfg.health.log_path,
        "STATUS: OK\n",
        Duration::from_secs(120 * 60),
    );

    let out = env.run(&cfg, &["health"]);

    assert_eq!(out.status.code(), Some(exit_codes::UNHEALTHY));
    let status = read(&env.repo.path().join("remote_server_status.txt"));
    assert!(status.contains("Status    : FAILURE\n"));
    assert!(status.contains("Message   : Health log stale ("));
    assert_eq!(env.repo.commit_count(), 2);
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("runwatch.toml");
    let run = |extra: &[&str]| {
        Command::new(env!("CARGO_BIN_EXE_runwatch"))
            .arg("--config")
            .arg(&path)
            .arg("init")
            .args(extra)
            .status()
            .expect("runwatch init")
    };

    assert_eq!(run(&[]).code(), Some(exit_codes::OK));
    assert_eq!(load_config(&path).expect("load"), MonitorConfig::default());
    assert_eq!(run(&[]).code(), Some(exit_codes::INVALID));
    assert_eq!(run(&["--force"]).code(), Some(exit_codes::OK));
}
