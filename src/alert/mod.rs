// src/alert/mod.rs

//! Build error reporting.
//!
//! A build error is transient: a failing task name plus a one-line message,
//! handed to the [`ErrorSink`] and then forgotten. The production sink rings
//! the terminal bell and prints one red line to stderr. Nothing in this
//! module returns an error or ends the process; after a report, control
//! always goes straight back to the caller.

use std::io::Write;

use owo_colors::OwoColorize;

pub mod memory;

pub use memory::MemorySink;

/// Consumer of build failures.
///
/// `report` must not panic and must not block for long; the task graph (or
/// the watch loop) continues immediately after every report.
pub trait ErrorSink: Send + Sync {
    fn report(&self, task: &str, message: &str);
}

/// Production sink: ASCII BEL plus a red one-liner on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorSink for ConsoleSink {
    fn report(&self, task: &str, message: &str) {
        let mut stderr = std::io::stderr();
        // Terminal bell; write errors are swallowed, reporting must not fail.
        let _ = write!(stderr, "\x07");
        let _ = writeln!(
            stderr,
            "{} {}",
            format!("Error in '{task}':").red().bold(),
            message
        );
    }
}
