// src/graph/task.rs

use std::future::Future;
use std::pin::Pin;

/// Public type alias for task names throughout the crate.
pub type TaskName = String;

/// Explicit result of an action.
///
/// Actions describe what happened instead of raising; the task graph turns a
/// `Failure` into an error-sink report and skips dependents, and the
/// surrounding run keeps going either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    /// Human-readable, single-line description of what went wrong.
    Failure(String),
}

/// A unit of build work attached to a task.
///
/// Implementations capture their inputs (file sets, destination, command
/// template) at construction time and re-evaluate the file sets on every
/// run, so a run always sees the current state of the filesystem.
pub trait Action: Send + Sync {
    fn run(&self) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>>;
}

/// Per-task status within a single `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// The action completed successfully (or the task has no action).
    Succeeded,
    /// The action returned a failure; it was reported via the error sink.
    Failed,
    /// A prerequisite (possibly transitively) failed, so the action was
    /// never invoked.
    Skipped,
}

/// Overall result of a `run` call.
///
/// Callers only ever observe "completed" or "reported failure"; the details
/// live in the per-task statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    ReportedFailure,
}

/// Statuses of every task that participated in a single `run` call, in
/// execution order.
#[derive(Debug, Clone)]
pub struct RunReport {
    target: TaskName,
    statuses: Vec<(TaskName, TaskStatus)>,
}

impl RunReport {
    pub(crate) fn new(target: TaskName) -> Self {
        Self {
            target,
            statuses: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, task: &str, status: TaskStatus) {
        self.statuses.push((task.to_string(), status));
    }

    /// The task this run was invoked for.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Status of a task in this run, if it participated.
    pub fn status(&self, task: &str) -> Option<TaskStatus> {
        self.statuses
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, status)| *status)
    }

    /// All participating tasks in execution order, with their statuses.
    pub fn statuses(&self) -> &[(TaskName, TaskStatus)] {
        &self.statuses
    }

    pub fn outcome(&self) -> RunOutcome {
        let all_ok = self
            .statuses
            .iter()
            .all(|(_, status)| *status == TaskStatus::Succeeded);
        if all_ok {
            RunOutcome::Completed
        } else {
            RunOutcome::ReportedFailure
        }
    }
}
