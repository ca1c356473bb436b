//! Remote health classification from health-log evidence.

use std::time::Duration;

/// Parameters of the health-log format and freshness policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRules<'a> {
    pub stale_after: Duration,
    pub status_prefix: &'a str,
    pub ok_payload: &'a str,
    pub ok_message: &'a str,
}

/// Classify a health log that exists and was modified `age` ago.
///
/// A stale log is distrusted regardless of content. Otherwise the newest line
/// starting with the status prefix decides: the OK payload means healthy, any
/// other payload is reported verbatim.
pub fn classify(age: Duration, contents: &str, rules: &HealthRules<'_>) -> (bool, String) {
    if age > rules.stale_after {
        let minutes = age.as_secs_f64() / 60.0;
        return (false, format!("Health log stale ({minutes:.1} minutes)"));
    }
    match latest_status_payload(contents, rules.status_prefix) {
        Some(payload) if payload == rules.ok_payload => (true, rules.ok_message.to_string()),
        Some(payload) => (false, payload.to_string()),
        None => (
            false,
            format!(
                "No {} line found in health log",
                rules.status_prefix.trim_end_matches(':')
            ),
        ),
    }
}

/// Payload of the most recent line beginning with `prefix`, trimmed.
pub fn latest_status_payload<'a>(contents: &'a str, prefix: &str) -> Option<&'a str> {
    contents
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::trim)
}
