//! Pipeline entry points.
//!
//! - `diff`: Classify changes between two states
//! - `run_monitor`: Fetch, diff, notify, and save in one run

pub mod diff;
pub mod run;

pub use diff::{Differ, SnapshotSpec};
pub use run::{RunOptions, RunReport, run_monitor};
