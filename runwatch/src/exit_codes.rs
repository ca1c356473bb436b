//! Stable exit codes for the scheduler invoking `runwatch`.

/// Pass completed and the report was published (or was already current).
pub const OK: i32 = 0;
/// A calibration run failed; the pass aborted before writing any report.
pub const CRITICAL_FAILURE: i32 = 1;
/// The report could not be written, committed or pushed.
pub const PUBLISH_FAILED: i32 = 2;
/// The remote health verdict is not ok (the status file is still published).
pub const UNHEALTHY: i32 = 3;
/// Invalid config, missing run root, or any other top-level error.
pub const INVALID: i32 = 4;
