// tests/graph_properties.rs

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use gust::alert::MemorySink;
use gust::graph::{Action, ActionOutcome, RunOutcome, TaskGraph, TaskStatus};

type RunLog = Arc<Mutex<Vec<usize>>>;

/// Action that logs its index on execution, optionally failing afterwards.
struct Numbered {
    index: usize,
    fail: bool,
    log: RunLog,
}

impl Action for Numbered {
    fn run(&self) -> Pin<Box<dyn Future<Output = ActionOutcome> + Send + '_>> {
        let log = Arc::clone(&self.log);
        let index = self.index;
        let fail = self.fail;
        Box::pin(async move {
            log.lock().unwrap().push(index);
            if fail {
                ActionOutcome::Failure(format!("task_{index} exploded"))
            } else {
                ActionOutcome::Success
            }
        })
    }
}

// Strategy to generate acyclic prerequisite lists. Task N may only depend on
// tasks 0..N-1, which rules out cycles by construction.
fn prereq_lists(max_tasks: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw_deps| {
            raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let mut valid: BTreeSet<usize> = BTreeSet::new();
                    for dep in potential {
                        if i > 0 {
                            valid.insert(dep % i);
                        }
                    }
                    valid.into_iter().collect()
                })
                .collect()
        })
    })
}

fn build_graph(prereqs: &[Vec<usize>], failing: &HashSet<usize>, log: &RunLog) -> TaskGraph {
    let mut graph = TaskGraph::new();
    for (i, deps) in prereqs.iter().enumerate() {
        let dep_names: Vec<String> = deps.iter().map(|d| format!("task_{d}")).collect();
        let dep_refs: Vec<&str> = dep_names.iter().map(|s| s.as_str()).collect();
        graph
            .register(
                format!("task_{i}"),
                &dep_refs,
                Some(Box::new(Numbered {
                    index: i,
                    fail: failing.contains(&i),
                    log: Arc::clone(log),
                })),
            )
            .unwrap();
    }
    graph.validate().unwrap();
    graph
}

fn task_index(name: &str) -> usize {
    name.strip_prefix("task_").unwrap().parse().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prerequisites_always_run_before_dependents_exactly_once(prereqs in prereq_lists(8)) {
        let log: RunLog = Arc::new(Mutex::new(Vec::new()));
        let graph = build_graph(&prereqs, &HashSet::new(), &log);

        let target = format!("task_{}", prereqs.len() - 1);
        let sink = MemorySink::new();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let report = runtime.block_on(graph.run(&target, &sink)).unwrap();

        let executed = log.lock().unwrap().clone();

        // No task runs twice, and the target always runs last.
        let unique: HashSet<usize> = executed.iter().copied().collect();
        prop_assert_eq!(unique.len(), executed.len(), "duplicate execution: {:?}", executed);
        prop_assert_eq!(executed.last().copied(), Some(prereqs.len() - 1));

        // Every prerequisite of an executed task ran, and ran earlier.
        let position: HashMap<usize, usize> =
            executed.iter().enumerate().map(|(pos, &i)| (i, pos)).collect();
        for &task in &executed {
            for &dep in &prereqs[task] {
                let dep_pos = position.get(&dep);
                prop_assert!(
                    dep_pos.is_some_and(|&p| p < position[&task]),
                    "task_{} ran before its prerequisite task_{}: {:?}",
                    task,
                    dep,
                    executed
                );
            }
        }

        prop_assert!(sink.is_empty());
        prop_assert_eq!(report.outcome(), RunOutcome::Completed);
        prop_assert_eq!(report.status(&target), Some(TaskStatus::Succeeded));
    }

    #[test]
    fn failures_are_reported_once_and_skip_only_downstream(
        prereqs in prereq_lists(8),
        failing_indices in proptest::collection::vec(0..8usize, 0..4),
    ) {
        let failing: HashSet<usize> = failing_indices
            .into_iter()
            .filter(|&i| i < prereqs.len())
            .collect();

        let log: RunLog = Arc::new(Mutex::new(Vec::new()));
        let graph = build_graph(&prereqs, &failing, &log);

        let target = format!("task_{}", prereqs.len() - 1);
        let sink = MemorySink::new();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let report = runtime.block_on(graph.run(&target, &sink)).unwrap();

        let statuses: HashMap<usize, TaskStatus> = report
            .statuses()
            .iter()
            .map(|(name, status)| (task_index(name), *status))
            .collect();

        // Exactly the failing tasks that actually ran get reported, once each.
        let reported: Vec<usize> = sink.reports().iter().map(|(t, _)| task_index(t)).collect();
        let reported_set: HashSet<usize> = reported.iter().copied().collect();
        let failed_set: HashSet<usize> = statuses
            .iter()
            .filter(|(_, s)| **s == TaskStatus::Failed)
            .map(|(i, _)| *i)
            .collect();
        prop_assert_eq!(reported.len(), reported_set.len(), "a failure was reported twice");
        prop_assert_eq!(&reported_set, &failed_set);
        prop_assert!(failed_set.is_subset(&failing));

        // Skipped tasks always sit downstream of a failure; succeeded tasks
        // never do. Tasks run exactly when they were not skipped.
        let executed: HashSet<usize> = log.lock().unwrap().iter().copied().collect();
        for (&task, &status) in &statuses {
            let upstream_trouble = prereqs[task].iter().any(|dep| {
                matches!(
                    statuses.get(dep),
                    Some(TaskStatus::Failed) | Some(TaskStatus::Skipped)
                )
            });
            match status {
                TaskStatus::Skipped => {
                    prop_assert!(upstream_trouble, "task_{} skipped without cause", task);
                    prop_assert!(!executed.contains(&task));
                }
                TaskStatus::Succeeded | TaskStatus::Failed => {
                    prop_assert!(!upstream_trouble, "task_{} ran past a failed prerequisite", task);
                    prop_assert!(executed.contains(&task));
                }
            }
        }

        let expected = if failed_set.is_empty() {
            RunOutcome::Completed
        } else {
            RunOutcome::ReportedFailure
        };
        prop_assert_eq!(report.outcome(), expected);
    }
}
