// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! NOTE: this expects `clap` to be built with the `derive` feature, e.g.:
//! `clap = { version = "4.5.53", features = ["derive"] }` in `Cargo.toml`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `gust`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gust",
    version,
    about = "Incremental build pipeline: compile sources, copy assets, watch and serve.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run once and exit (e.g. `build`, `compile`, `assets`).
    ///
    /// When omitted (or given as `default`), gust stays resident: it serves
    /// the destination directory, runs a full build, and rebuilds on file
    /// changes until interrupted.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Gust.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Gust.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GUST_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph and watch setup, but don't
    /// execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
