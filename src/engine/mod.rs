// src/engine/mod.rs

//! Orchestration engine for gust.
//!
//! The runtime event loop reacts to:
//! - file-watch triggers
//! - completion of spawned task-graph runs
//! - shutdown signals
//!
//! It never exits because a build failed; failures are reported through the
//! error sink and watching continues until shutdown is requested.

pub mod runtime;

pub use runtime::{Runtime, RuntimeEvent, TriggerReason};
