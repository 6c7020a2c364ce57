// src/lib.rs

pub mod alert;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod serve;
pub mod watch;

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::alert::{ConsoleSink, ErrorSink};
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::engine::{Runtime, RuntimeEvent, TriggerReason};
use crate::errors::{GustError, Result};
use crate::graph::{RunOutcome, TaskGraph};
use crate::pipeline::{CopyAssetsAction, TransformAction};
use crate::watch::{FileSet, WatchBinding};

/// Well-known task names wired by the orchestrator.
///
/// `init` is a barrier every build step waits on; `build` groups the whole
/// pipeline. Both carry no action of their own.
pub const TASK_INIT: &str = "init";
pub const TASK_COMPILE: &str = "compile";
pub const TASK_ASSETS: &str = "assets";
pub const TASK_BUILD: &str = "build";

/// Pseudo-task name selecting the resident mode (serve + build + watch).
/// It is not part of the task graph.
pub const TASK_DEFAULT: &str = "default";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the task graph (`init` -> `compile` / `assets` -> `build`)
/// - a one-shot run, or the resident serve + build + watch mode
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);

    let graph = build_graph(&cfg, &root)?;
    graph.validate()?;

    if args.dry_run {
        let bindings = build_watch_bindings(&cfg, &root)?;
        print_dry_run(&graph, &bindings, &cfg);
        return Ok(());
    }

    let sink: Arc<dyn ErrorSink> = Arc::new(ConsoleSink::new());

    match args.task.as_deref() {
        None | Some(TASK_DEFAULT) => run_resident(&cfg, &root, graph, sink).await,
        Some(task) => run_once(task, &graph, sink.as_ref()).await,
    }
}

/// Construct the task graph for this configuration.
///
/// Shape: `init` (barrier) is a prerequisite of `compile` and `assets`;
/// `build` (barrier) runs after both. `assets` only exists when the config
/// has a `[build.assets]` section.
pub fn build_graph(cfg: &ConfigFile, root: &Path) -> Result<TaskGraph> {
    let mut graph = TaskGraph::new();

    graph.register(TASK_INIT, &[], None)?;

    let transform = TransformAction::from_config(&cfg.build, root)?;
    graph.register(TASK_COMPILE, &[TASK_INIT], Some(Box::new(transform)))?;

    let mut build_prereqs: Vec<&str> = vec![TASK_COMPILE];
    if let Some(assets) = &cfg.build.assets {
        let copy = CopyAssetsAction::from_config(assets, &cfg.build.dest, root)?;
        graph.register(TASK_ASSETS, &[TASK_INIT], Some(Box::new(copy)))?;
        build_prereqs.push(TASK_ASSETS);
    }

    graph.register(TASK_BUILD, &build_prereqs, None)?;
    Ok(graph)
}

/// Watch bindings for this configuration: transform-source changes re-run
/// `compile`, asset changes re-run `assets`.
pub fn build_watch_bindings(cfg: &ConfigFile, root: &Path) -> Result<Vec<WatchBinding>> {
    let t = &cfg.build.transform;
    let mut bindings = vec![WatchBinding::new(
        FileSet::new(root, t.sources.clone(), t.exclude.clone())?,
        vec![TASK_COMPILE.to_string()],
    )];

    if let Some(assets) = &cfg.build.assets {
        bindings.push(WatchBinding::new(
            FileSet::new(root, assets.sources.clone(), assets.exclude.clone())?,
            vec![TASK_ASSETS.to_string()],
        ));
    }

    Ok(bindings)
}

/// Run a single task and exit.
///
/// A reported build failure still exits cleanly: the failure was already
/// surfaced through the sink, same as in watch mode. Only structural misuse
/// (unknown task, cycle) bubbles up as an error.
async fn run_once(task: &str, graph: &TaskGraph, sink: &dyn ErrorSink) -> Result<()> {
    let report = graph.run(task, sink).await?;
    match report.outcome() {
        RunOutcome::Completed => info!(task = %task, "build finished"),
        RunOutcome::ReportedFailure => {
            warn!(task = %task, "build finished with reported failure")
        }
    }
    Ok(())
}

/// Resident mode: serve the destination, run a full build, rebuild on
/// changes, until Ctrl-C.
async fn run_resident(
    cfg: &ConfigFile,
    root: &Path,
    graph: TaskGraph,
    sink: Arc<dyn ErrorSink>,
) -> Result<()> {
    let graph = Arc::new(graph);
    let dest = root.join(&cfg.build.dest);

    // Dev server; fully independent of the build/watch side. A failed bind
    // (port taken) is logged, watching continues without the server.
    let addr = serve_addr(cfg)?;
    {
        let dest = dest.clone();
        tokio::spawn(async move {
            if let Err(err) = serve::serve(dest, addr).await {
                error!(error = %err, "dev server terminated");
            }
        });
    }

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // File watcher.
    let bindings = build_watch_bindings(cfg, root)?;
    let _watcher_handle = watch::spawn_watcher(
        root.to_path_buf(),
        bindings,
        dest,
        Duration::from_millis(cfg.watch.debounce_ms),
        rt_tx.clone(),
    )?;

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    // Seed the initial full build.
    info!(task = TASK_BUILD, "seeding initial build");
    rt_tx
        .send(RuntimeEvent::TasksTriggered {
            tasks: vec![TASK_BUILD.to_string()],
            reason: TriggerReason::Startup,
        })
        .await
        .map_err(|err| anyhow::anyhow!("seeding initial build: {err}"))?;

    let runtime = Runtime::new(graph, sink, rt_rx, rt_tx);
    runtime.run().await?;
    Ok(())
}

/// Socket address for the dev server from `[serve]`.
fn serve_addr(cfg: &ConfigFile) -> Result<SocketAddr> {
    let host: IpAddr = cfg
        .serve
        .host
        .parse()
        .map_err(|_| GustError::Config(format!("invalid [serve].host: {:?}", cfg.serve.host)))?;
    Ok(SocketAddr::new(host, cfg.serve.port))
}

/// Figure out a sensible project root for watching and pattern evaluation.
/// Currently: directory containing the config file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple dry-run output: print tasks, prerequisites and watch setup.
fn print_dry_run(graph: &TaskGraph, bindings: &[WatchBinding], cfg: &ConfigFile) {
    println!("gust dry-run");
    println!("  dest = {}", cfg.build.dest);
    println!();

    println!("tasks ({}):", graph.task_names().count());
    for name in graph.task_names() {
        println!("  - {name}");
        let prereqs = graph.prerequisites_of(name);
        if !prereqs.is_empty() {
            println!("      after: {:?}", prereqs);
        }
    }
    println!();

    println!("watch (debounce {}ms):", cfg.watch.debounce_ms);
    for binding in bindings {
        println!("  - {:?} -> {:?}", binding.patterns(), binding.tasks());
    }
    println!();

    println!("serve: http://{}:{}/", cfg.serve.host, cfg.serve.port);

    debug!("dry-run complete (no execution)");
}
