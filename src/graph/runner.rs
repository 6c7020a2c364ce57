// src/graph/runner.rs

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, info, warn};

use crate::alert::ErrorSink;
use crate::errors::{GustError, Result};
use crate::graph::task::{Action, ActionOutcome, RunOutcome, RunReport, TaskName, TaskStatus};

/// A registered task: name, ordered prerequisites, optional action.
struct TaskEntry {
    name: TaskName,
    prereqs: Vec<TaskName>,
    action: Option<Box<dyn Action>>,
}

/// Explicit task graph: named tasks with declared prerequisites.
///
/// The graph is built by the orchestrator (or a test) and passed around by
/// reference; there is no global registry. `run` executes the transitive
/// prerequisite closure of a task depth-first, honoring the declared
/// prerequisite order, each task at most once per call.
///
/// Tasks without an action are sequencing barriers: they succeed immediately
/// and exist only to group or order other tasks.
pub struct TaskGraph {
    tasks: HashMap<TaskName, TaskEntry>,
    /// Registration order, for stable diagnostics output.
    order: Vec<TaskName>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a task under a unique name.
    ///
    /// Prerequisites may refer to tasks registered later; [`Self::validate`]
    /// checks that every reference eventually resolves.
    pub fn register<N: Into<TaskName>>(
        &mut self,
        name: N,
        prereqs: &[&str],
        action: Option<Box<dyn Action>>,
    ) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(GustError::DuplicateTask(name));
        }

        debug!(task = %name, prereqs = ?prereqs, "task registered");
        self.order.push(name.clone());
        self.tasks.insert(
            name.clone(),
            TaskEntry {
                name,
                prereqs: prereqs.iter().map(|s| s.to_string()).collect(),
                action,
            },
        );
        Ok(())
    }

    /// Whether a task with this name has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All task names in registration order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Declared prerequisites of a task, in order.
    pub fn prerequisites_of(&self, name: &str) -> &[TaskName] {
        self.tasks
            .get(name)
            .map(|entry| entry.prereqs.as_slice())
            .unwrap_or(&[])
    }

    /// Validate that every prerequisite refers to a registered task, no task
    /// depends on itself, and the dependency relation is acyclic.
    pub fn validate(&self) -> Result<()> {
        for entry in self.tasks.values() {
            for dep in &entry.prereqs {
                if !self.contains(dep) {
                    return Err(GustError::UnknownTask(format!(
                        "{dep} (prerequisite of '{}')",
                        entry.name
                    )));
                }
                if dep == &entry.name {
                    return Err(GustError::GraphCycle(entry.name.clone()));
                }
            }
        }

        // Edge direction: prerequisite -> dependent. A topological sort
        // fails exactly when there is a cycle.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }
        for entry in self.tasks.values() {
            for dep in &entry.prereqs {
                graph.add_edge(dep.as_str(), entry.name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(GustError::GraphCycle(cycle.node_id().to_string())),
        }
    }

    /// Run a task: all prerequisites first (in declared order, each fully
    /// before the next), then the task's own action.
    ///
    /// A failing action is reported through `sink` exactly once and marks
    /// its dependents as skipped; independent siblings still run. The `Err`
    /// case is reserved for structural misuse (unknown task, cycle), never
    /// for a failing action.
    pub async fn run(&self, name: &str, sink: &dyn ErrorSink) -> Result<RunReport> {
        let order = self.resolve_order(name)?;
        info!(task = %name, steps = order.len(), "starting run");

        let mut report = RunReport::new(name.to_string());
        let mut statuses: HashMap<&str, TaskStatus> = HashMap::new();

        for entry in order {
            let blocked = entry.prereqs.iter().any(|p| {
                matches!(
                    statuses.get(p.as_str()),
                    Some(TaskStatus::Failed) | Some(TaskStatus::Skipped)
                )
            });
            if blocked {
                warn!(task = %entry.name, "skipping task: a prerequisite failed");
                statuses.insert(entry.name.as_str(), TaskStatus::Skipped);
                report.record(&entry.name, TaskStatus::Skipped);
                continue;
            }

            let status = match &entry.action {
                None => {
                    debug!(task = %entry.name, "no action, sequencing barrier");
                    TaskStatus::Succeeded
                }
                Some(action) => {
                    debug!(task = %entry.name, "running action");
                    let started = Instant::now();
                    match action.run().await {
                        ActionOutcome::Success => {
                            info!(
                                task = %entry.name,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "task completed"
                            );
                            TaskStatus::Succeeded
                        }
                        ActionOutcome::Failure(message) => {
                            warn!(task = %entry.name, error = %message, "task failed");
                            sink.report(&entry.name, &message);
                            TaskStatus::Failed
                        }
                    }
                }
            };

            statuses.insert(entry.name.as_str(), status);
            report.record(&entry.name, status);
        }

        match report.outcome() {
            RunOutcome::Completed => info!(task = %name, "run completed"),
            RunOutcome::ReportedFailure => {
                warn!(task = %name, "run finished with reported failure")
            }
        }

        Ok(report)
    }

    /// Depth-first post-order over prerequisites: every task appears after
    /// all of its prerequisites, siblings keep their declared order, and no
    /// task appears twice.
    fn resolve_order(&self, target: &str) -> Result<Vec<&TaskEntry>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut in_stack: HashSet<&str> = HashSet::new();
        let mut order: Vec<&TaskEntry> = Vec::new();
        self.visit(target, &mut visited, &mut in_stack, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        visited: &mut HashSet<&'a str>,
        in_stack: &mut HashSet<&'a str>,
        order: &mut Vec<&'a TaskEntry>,
    ) -> Result<()> {
        let entry = self
            .tasks
            .get(name)
            .ok_or_else(|| GustError::UnknownTask(name.to_string()))?;

        if visited.contains(entry.name.as_str()) {
            return Ok(());
        }
        if !in_stack.insert(entry.name.as_str()) {
            return Err(GustError::GraphCycle(entry.name.clone()));
        }

        for dep in &entry.prereqs {
            self.visit(dep, visited, in_stack, order)?;
        }

        in_stack.remove(entry.name.as_str());
        visited.insert(entry.name.as_str());
        order.push(entry);
        Ok(())
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}
