//! I/O helpers for the reporting passes.

pub mod config;
pub mod git;
pub mod health_log;
pub mod process;
pub mod publish_log;
pub mod runs;
