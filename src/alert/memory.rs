// src/alert/memory.rs

//! Recording sink, used by tests that assert on reported failures.

use std::sync::{Arc, Mutex};

use super::ErrorSink;

/// Sink that records every report in memory.
///
/// Clones share the same underlying storage, so a test can keep one handle
/// and hand another to the graph or the runtime.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    reports: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(task, message)` pairs reported so far, in order.
    pub fn reports(&self) -> Vec<(String, String)> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, String)>> {
        // A poisoned lock only means a reporter panicked mid-push; the
        // recorded data is still usable.
        self.reports.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ErrorSink for MemorySink {
    fn report(&self, task: &str, message: &str) {
        self.lock().push((task.to_string(), message.to_string()));
    }
}
