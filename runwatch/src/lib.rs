//! Batch-run and remote-health status reporter.
//!
//! A single pass inspects recent run directories (or a remote health log),
//! decides a verdict from filesystem evidence alone, renders a fixed-format
//! report and publishes it to a git working copy. The architecture keeps a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (ordering, classification,
//!   gating, rendering). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, log reading, git,
//!   process execution). Isolated to enable test doubles.
//!
//! Orchestration modules ([`publish`], [`pass`]) coordinate core logic with
//! I/O to implement CLI commands.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pass;
pub mod publish;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
