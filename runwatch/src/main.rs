//! Batch-run and remote-health status reporter.
//!
//! `runwatch runs` reports the most recent run directories, `runwatch health`
//! reports the remote server status. Both publish the rendered report to a git
//! working copy. Designed to be invoked by an external scheduler.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use runwatch::exit_codes;
use runwatch::io::config::{MonitorConfig, load_config, write_config};
use runwatch::io::git::Git;
use runwatch::logging;
use runwatch::pass::{HealthOutcome, PassOptions, RunsOutcome, run_health_pass, run_runs_pass};

#[derive(Parser)]
#[command(
    name = "runwatch",
    version,
    about = "Report batch run status and remote health into a git repository"
)]
struct Cli {
    /// Config file; missing means built-in defaults.
    #[arg(long, global = true, default_value = "runwatch.toml")]
    config: PathBuf,

    /// Debug diagnostics on stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate the most recent runs and publish the run report.
    Runs {
        /// Directory whose subdirectories are runs.
        #[arg(long)]
        root: Option<PathBuf>,
        /// Git working copy the report is committed into.
        #[arg(long)]
        repo: Option<PathBuf>,
        /// Number of most recent runs to report.
        #[arg(long)]
        limit: Option<usize>,
        /// Print the report instead of publishing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Check the remote health log and publish the status file.
    Health {
        /// Health log written by the remote probe.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Git working copy the status file is committed into.
        #[arg(long)]
        repo: Option<PathBuf>,
        /// Print the status instead of publishing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(exit_codes::INVALID);
        }
        Err(err) => err.exit(),
    };
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Runs {
            root,
            repo,
            limit,
            dry_run,
        } => {
            let mut cfg = load_config(&cli.config)?;
            if let Some(root) = root {
                cfg.runs.root_dir = root;
            }
            if let Some(limit) = limit {
                cfg.runs.limit = limit;
            }
            apply_repo(&mut cfg, repo)?;
            cmd_runs(&cfg, dry_run)
        }
        Command::Health { log, repo, dry_run } => {
            let mut cfg = load_config(&cli.config)?;
            if let Some(log) = log {
                cfg.health.log_path = log;
            }
            apply_repo(&mut cfg, repo)?;
            Ok(cmd_health(&cfg, dry_run))
        }
    }
}

fn apply_repo(cfg: &mut MonitorConfig, repo: Option<PathBuf>) -> Result<()> {
    if let Some(repo) = repo {
        cfg.publish.repo_path = repo;
    }
    cfg.validate()
}

fn git_for(cfg: &MonitorConfig) -> Git {
    Git::new(
        &cfg.publish.repo_path,
        cfg.publish.command_timeout(),
        cfg.publish.output_limit_bytes,
    )
}

fn options(dry_run: bool) -> PassOptions {
    PassOptions {
        now: Local::now(),
        dry_run,
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &MonitorConfig::default())
        .with_context(|| format!("write default config {}", path.display()))?;
    println!("{}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_runs(cfg: &MonitorConfig, dry_run: bool) -> Result<i32> {
    let outcome = run_runs_pass(cfg, &git_for(cfg), options(dry_run))
        .with_context(|| format!("run report for {}", cfg.runs.root_dir.display()))?;
    match &outcome {
        RunsOutcome::DryRun { report, .. } => print!("{report}"),
        RunsOutcome::CriticalFailure { failed_runs, .. } => {
            eprintln!(
                "calibration failed in {}; report not updated",
                failed_runs.join(", ")
            );
        }
        RunsOutcome::Published { publish, .. } => {
            if let Some(err) = &publish.error {
                eprintln!("publish failed: {err}");
            }
        }
    }
    Ok(outcome.exit_code())
}

fn cmd_health(cfg: &MonitorConfig, dry_run: bool) -> i32 {
    let outcome = run_health_pass(cfg, &git_for(cfg), options(dry_run));
    match &outcome {
        HealthOutcome::DryRun { report, .. } => print!("{report}"),
        HealthOutcome::Published { verdict, publish } => {
            if !verdict.ok {
                eprintln!("remote unhealthy: {}", verdict.message);
            }
            if let Some(err) = &publish.error {
                eprintln!("publish failed: {err}");
            }
        }
    }
    outcome.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["runwatch", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
        assert_eq!(cli.config, PathBuf::from("runwatch.toml"));
    }

    #[test]
    fn parse_runs_with_overrides() {
        let cli = Cli::parse_from([
            "runwatch", "-v", "runs", "--root", "/data/runs", "--limit", "2", "--dry-run",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Command::Runs {
                root,
                repo,
                limit,
                dry_run,
            } => {
                assert_eq!(root, Some(PathBuf::from("/data/runs")));
                assert_eq!(repo, None);
                assert_eq!(limit, Some(2));
                assert!(dry_run);
            }
            _ => panic!("expected runs command"),
        }
    }

    #[test]
    fn parse_health_with_global_config_after_subcommand() {
        let cli = Cli::parse_from(["runwatch", "health", "--log", "probe.log", "--config", "x.toml"]);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(
            cli.command,
            Command::Health { log: Some(_), repo: None, dry_run: false }
        ));
    }

    #[test]
    fn zero_limit_override_is_rejected() {
        let mut cfg = MonitorConfig::default();
        cfg.runs.limit = 0;
        assert!(apply_repo(&mut cfg, None).is_err());
    }
}
