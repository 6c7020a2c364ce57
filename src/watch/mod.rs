// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling glob pattern lists into matchable, enumerable file sets.
//! - Binding file sets to the tasks they should re-trigger.
//! - Wiring up a cross-platform filesystem watcher (`notify`) with
//!   debouncing, so change bursts collapse into single triggers.
//!
//! It does **not** know about the task graph internals or the build
//! actions; it only turns filesystem changes into task-level triggers.

pub mod binding;
pub mod fileset;
pub mod watcher;

pub use binding::WatchBinding;
pub use fileset::FileSet;
pub use watcher::{spawn_watcher, WatcherHandle};
