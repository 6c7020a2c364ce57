// tests/watch_runtime.rs

mod common;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use gust::alert::MemorySink;
use gust::config::ConfigFile;
use gust::engine::{Runtime, RuntimeEvent, TriggerReason};
use gust::{build_graph, TASK_BUILD};

use crate::common::{init_tracing, wait_until};

type TestResult = Result<(), Box<dyn Error>>;

fn write_file(root: &Path, rel: &str, contents: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn trigger(tasks: &[&str]) -> RuntimeEvent {
    RuntimeEvent::TasksTriggered {
        tasks: tasks.iter().map(|s| s.to_string()).collect(),
        reason: TriggerReason::FileWatch,
    }
}

#[cfg(unix)]
#[tokio::test]
async fn runtime_keeps_accepting_triggers_after_a_failed_build() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    write_file(dir.path(), "src/a.foo", "BOOM")?;

    let cfg: ConfigFile = toml::from_str(
        r#"
        [build]
        dest = "dist"

        [build.transform]
        sources = ["src/*.foo"]
        command = "grep -q BOOM {input} && exit 1 || cp {input} {output}"
        "#,
    )?;

    let graph = Arc::new(build_graph(&cfg, dir.path())?);
    let sink = MemorySink::new();

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let runtime = Runtime::new(graph, Arc::new(sink.clone()), rx, tx.clone());
    let runtime_task = tokio::spawn(runtime.run());

    // First build fails; it must be reported and the loop must survive.
    tx.send(trigger(&[TASK_BUILD])).await?;
    wait_until("first failure report", || sink.len() == 1).await?;

    // Fix the source and trigger again.
    write_file(dir.path(), "src/a.foo", "fixed")?;
    tx.send(trigger(&[TASK_BUILD])).await?;
    wait_until("artifact after recovery", || {
        dir.path().join("dist/a.html").exists()
    })
    .await?;

    assert_eq!(sink.len(), 1, "the recovered build must not report again");

    tx.send(RuntimeEvent::ShutdownRequested).await?;
    let run_result = timeout(Duration::from_secs(3), runtime_task).await??;
    run_result?;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn overlapping_triggers_are_tolerated() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    write_file(dir.path(), "src/a.foo", "slow")?;

    let cfg: ConfigFile = toml::from_str(
        r#"
        [build]
        dest = "dist"

        [build.transform]
        sources = ["src/*.foo"]
        command = "sleep 0.2; cp {input} {output}"
        "#,
    )?;

    let graph = Arc::new(build_graph(&cfg, dir.path())?);
    let sink = MemorySink::new();

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(16);
    let runtime = Runtime::new(graph, Arc::new(sink.clone()), rx, tx.clone());
    let runtime_task = tokio::spawn(runtime.run());

    // Second trigger lands while the first build is still sleeping; the
    // event loop must accept it instead of blocking on the running build.
    tx.send(trigger(&[TASK_BUILD])).await?;
    tx.send(trigger(&[TASK_BUILD])).await?;

    wait_until("artifact from overlapping builds", || {
        dir.path().join("dist/a.html").exists()
    })
    .await?;
    assert!(sink.is_empty());

    tx.send(RuntimeEvent::ShutdownRequested).await?;
    let run_result = timeout(Duration::from_secs(3), runtime_task).await??;
    run_result?;
    Ok(())
}
