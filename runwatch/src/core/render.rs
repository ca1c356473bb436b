//! Deterministic report rendering.
//!
//! Output must be byte-stable for identical inputs so the publisher can rely
//! on git to detect "no change".

use chrono::NaiveDateTime;

use crate::core::types::{HealthVerdict, RunEvaluation, yes_no};

/// Timestamp pattern used in every rendered document and the publish log.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const RUN_TABLE_HEADER: &str =
    "| Folder Name | Status | Run Time (min) | Calibration | Plots | Reporting |";
const RUN_TABLE_RULE: &str =
    "|-------------|--------|----------------|-------------|-------|-----------|";

/// Render the markdown run report.
pub fn render_run_report(
    title: &str,
    generated_at: NaiveDateTime,
    evaluations: &[RunEvaluation],
) -> String {
    let mut lines = vec![
        format!("# {title}"),
        format!("Generated on {}", generated_at.format(TIMESTAMP_FORMAT)),
        String::new(),
        RUN_TABLE_HEADER.to_string(),
        RUN_TABLE_RULE.to_string(),
    ];
    for eval in evaluations {
        lines.push(format!(
            "| {} | {} | {:.2} | {} | {} | {} |",
            eval.name,
            eval.status,
            eval.duration_minutes,
            eval.calibration,
            yes_no(eval.has_plots),
            yes_no(eval.has_reporting),
        ));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render the plain-text remote status block.
pub fn render_health_report(verdict: &HealthVerdict) -> String {
    let status = if verdict.ok { "OK" } else { "FAILURE" };
    format!(
        "Timestamp : {}\nStatus    : {}\nMessage   : {}\n",
        verdict.checked_at.format(TIMESTAMP_FORMAT),
        status,
        verdict.message
    )
}

/// Expand a commit message template; `{date}` becomes the pass date.
pub fn commit_message(template: &str, at: NaiveDateTime) -> String {
    template.replace("{date}", &at.format("%Y-%m-%d").to_string())
}
