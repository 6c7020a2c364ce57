// src/watch/binding.rs

use crate::graph::TaskName;
use crate::watch::fileset::FileSet;

/// Association between a file set and the tasks to re-run when a path in
/// that set changes.
///
/// Bindings are built once at startup and live for the lifetime of the
/// watcher; the file set inside is only used for matching, never for
/// enumeration (the triggered actions re-enumerate on their own).
#[derive(Debug, Clone)]
pub struct WatchBinding {
    fileset: FileSet,
    tasks: Vec<TaskName>,
}

impl WatchBinding {
    pub fn new(fileset: FileSet, tasks: Vec<TaskName>) -> Self {
        Self { fileset, tasks }
    }

    /// Tasks to trigger when this binding matches, in declared order.
    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }

    /// The bound include patterns, for diagnostics output.
    pub fn patterns(&self) -> &[String] {
        self.fileset.patterns()
    }

    /// Whether a root-relative, forward-slash path belongs to the bound set.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.fileset.matches(rel_path)
    }
}
