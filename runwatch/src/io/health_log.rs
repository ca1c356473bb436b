//! Remote health log inspection.
//!
//! Never returns an error: a log that cannot be found, stat'ed or read is
//! itself an unhealthy verdict.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use crate::core::health::{HealthRules, classify};
use crate::core::types::HealthVerdict;
use crate::io::runs::read_lossy;

const MISSING_MESSAGE: &str = "Health log missing or server unreachable";

/// Classify the health log at `path` as of `now`.
#[instrument(skip_all, fields(log = %path.display()))]
pub fn check_remote_health(
    path: &Path,
    rules: &HealthRules<'_>,
    now: SystemTime,
    checked_at: NaiveDateTime,
) -> HealthVerdict {
    let (ok, message) = inspect(path, rules, now);
    debug!(ok, %message, "health classified");
    HealthVerdict {
        ok,
        message,
        checked_at,
    }
}

fn inspect(path: &Path, rules: &HealthRules<'_>, now: SystemTime) -> (bool, String) {
    if !path.exists() {
        return (false, MISSING_MESSAGE.to_string());
    }
    let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        Err(err) => return (false, format!("Cannot stat health log ({err})")),
    };
    // A timestamp from the future counts as fresh.
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    if age > rules.stale_after {
        return classify(age, "", rules);
    }
    match read_lossy(path) {
        Ok(contents) => classify(age, &contents, rules),
        Err(err) => (false, format!("Cannot read health log ({err})")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::HealthConfig;
    use crate::test_support::{fixed_time, write_with_age};

    fn check(path: &Path) -> HealthVerdict {
        let cfg = HealthConfig::default();
        check_remote_health(path, &cfg.rules(), SystemTime::now(), fixed_time())
    }

    #[test]
    fn fresh_ok_log_is_healthy() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("remote-health.log");
        write_with_age(&log, "probe started\nSTATUS: OK\n", Duration::from_secs(5 * 60));

        let verdict = check(&log);
        assert!(verdict.ok);
        assert_eq!(verdict.message, "Remote server accessible");
        assert_eq!(verdict.checked_at, fixed_time());
    }

    #[test]
    fn stale_ok_log_is_unhealthy() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("remote-health.log");
        write_with_age(&log, "STATUS: OK\n", Duration::from_secs(120 * 60));

        let verdict = check(&log);
        assert!(!verdict.ok);
        assert!(verdict.message.starts_with("Health log stale ("));
    }

    #[test]
    fn missing_log_is_unreachable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let verdict = check(&temp.path().join("absent.log"));
        assert!(!verdict.ok);
        assert_eq!(verdict.message, MISSING_MESSAGE);
    }

    #[test]
    fn failure_payload_is_reported_verbatim() {
        let temp = tempfile::tempdir().expect("tempdir");
        let log = temp.path().join("remote-health.log");
        write_with_age(
            &log,
            "STATUS: OK\nSTATUS: Test-NetConnection 3389 failed\n",
            Duration::from_secs(60),
        );

        let verdict = check(&log);
        assert!(!verdict.ok);
        assert_eq!(verdict.message, "Test-NetConnection 3389 failed");
    }

    #[test]
    fn unreadable_log_is_unhealthy() {
        let temp = tempfile::tempdir().expect("tempdir");
        // A directory exists and has an mtime but cannot be read as a file.
        let log = temp.path().join("remote-health.log");
        fs::create_dir(&log).expect("mkdir");

        let verdict = check(&log);
        assert!(!verdict.ok);
        assert!(verdict.message.starts_with("Cannot read health log ("));
    }
}
