//! Deterministic, pure logic shared by the reporting passes.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values (listings, log text, evaluations) and return deterministic outputs
//! suitable for tests.

pub mod calibration;
pub mod gate;
pub mod health;
pub mod render;
pub mod selection;
pub mod types;
