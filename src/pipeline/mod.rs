//! Pipeline entry points.
//!
//! - `Watcher::run`: one full pass (load, extract, diff, notify, persist)
//! - `take_new`: set-based novelty detection

pub mod diff;
pub mod run;

pub use diff::take_new;
pub use run::{RunOptions, RunReport, SourceReport, Watcher, run_once};
