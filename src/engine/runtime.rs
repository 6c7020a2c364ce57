// src/engine/runtime.rs

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::alert::ErrorSink;
use crate::graph::{RunOutcome, TaskGraph, TaskName};

/// Reason why tasks were triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    FileWatch,
    Startup,
}

/// Events sent into the runtime from the watcher, spawned runs, or
/// external signals.
///
/// The idea is that:
/// - the file watcher sends `TasksTriggered`
/// - spawned runs send `RunFinished` back when done
/// - Ctrl-C handling sends `ShutdownRequested`
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    TasksTriggered {
        tasks: Vec<TaskName>,
        reason: TriggerReason,
    },
    RunFinished {
        target: TaskName,
        outcome: RunOutcome,
    },
    ShutdownRequested,
}

/// The resident orchestration runtime.
///
/// Consumes `RuntimeEvent`s and spawns task-graph runs without waiting for
/// them, so the event loop keeps accepting filesystem triggers while builds
/// are in flight. Two builds overlapping is accepted: both write to dest
/// and the later writer wins. A reported build failure never stops the
/// loop; only an explicit shutdown does.
pub struct Runtime {
    graph: Arc<TaskGraph>,
    sink: Arc<dyn ErrorSink>,

    /// Unified event stream from all producers (watcher, runs, signal handler).
    events_rx: mpsc::Receiver<RuntimeEvent>,

    /// Cloned into spawned runs so they can send `RunFinished` back.
    events_tx: mpsc::Sender<RuntimeEvent>,

    /// Number of spawned runs that have not reported back yet.
    in_flight: usize,
}

impl Runtime {
    pub fn new(
        graph: Arc<TaskGraph>,
        sink: Arc<dyn ErrorSink>,
        events_rx: mpsc::Receiver<RuntimeEvent>,
        events_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            graph,
            sink,
            events_rx,
            events_tx,
            in_flight: 0,
        }
    }

    /// Main event loop.
    ///
    /// This should be called from `lib.rs` after:
    /// - config is loaded & validated
    /// - the task graph is built and validated
    /// - watcher, dev server and Ctrl-C handler have been spawned with a
    ///   clone of the `mpsc::Sender<RuntimeEvent>`
    pub async fn run(mut self) -> Result<()> {
        info!("runtime started");

        while let Some(event) = self.events_rx.recv().await {
            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::TasksTriggered { tasks, reason } => {
                    self.spawn_run(tasks, reason);
                }
                RuntimeEvent::RunFinished { target, outcome } => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    match outcome {
                        RunOutcome::Completed => {
                            info!(task = %target, in_flight = self.in_flight, "run finished")
                        }
                        RunOutcome::ReportedFailure => {
                            warn!(
                                task = %target,
                                in_flight = self.in_flight,
                                "run finished with reported failure, still watching"
                            )
                        }
                    }
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested, stopping runtime");
                    break;
                }
            }
        }

        info!("runtime exiting");
        Ok(())
    }

    /// Spawn one run per triggered task and return to the event loop
    /// immediately. A second trigger arriving mid-build gets its own run;
    /// runs are not serialized against each other.
    fn spawn_run(&mut self, tasks: Vec<TaskName>, reason: TriggerReason) {
        if tasks.is_empty() {
            return;
        }

        info!(?tasks, ?reason, "tasks triggered");
        self.in_flight += tasks.len();

        let graph = Arc::clone(&self.graph);
        let sink = Arc::clone(&self.sink);
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            for task in &tasks {
                let finished = match graph.run(task, sink.as_ref()).await {
                    Ok(report) => RuntimeEvent::RunFinished {
                        target: report.target().to_string(),
                        outcome: report.outcome(),
                    },
                    Err(err) => {
                        // Structural error (unknown task, cycle). Bindings
                        // are validated at startup, so this indicates a bug;
                        // log it and keep the runtime alive regardless.
                        error!(task = %task, error = %err, "task run could not start");
                        RuntimeEvent::RunFinished {
                            target: task.clone(),
                            outcome: RunOutcome::ReportedFailure,
                        }
                    }
                };

                if events_tx.send(finished).await.is_err() {
                    // Runtime already gone; nothing left to notify.
                    return;
                }
            }
        });
    }
}
