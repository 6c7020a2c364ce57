// src/graph/mod.rs

//! Task graph: named units of build work with declared prerequisites.
//!
//! - [`task`] defines the vocabulary: actions, their outcomes, per-run
//!   statuses and reports.
//! - [`runner`] holds the graph itself and the depth-first run logic.
//!
//! The graph knows nothing about files, commands, or watching; actions are
//! opaque and the watch/serve layers sit entirely above it.

pub mod runner;
pub mod task;

pub use runner::TaskGraph;
pub use task::{Action, ActionOutcome, RunOutcome, RunReport, TaskName, TaskStatus};
