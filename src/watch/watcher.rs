// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::graph::TaskName;
use crate::watch::binding::WatchBinding;
use crate::watch::fileset::to_slash;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes `root` recursively and sends
/// `RuntimeEvent::TasksTriggered` for bindings whose patterns match a
/// changed path.
///
/// Change events arriving within `debounce` of each other are coalesced
/// into a single trigger carrying the deduplicated task list, so an editor
/// save touching several files causes one rebuild.
///
/// Paths under `dest` are never considered, so build outputs cannot
/// re-trigger the build that produced them; `dest` is created here if
/// missing, so this holds from the very first build. Hidden files and
/// directories (leading dot) are ignored as well.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    dest: impl Into<PathBuf>,
    debounce: Duration,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    // Canonicalize so event paths compare against the same form. Only an
    // existing path canonicalizes, and dest usually does not exist before
    // the first build, so create it up front.
    let root = root.into();
    let root = root.canonicalize().unwrap_or(root);
    let dest = dest.into();
    if let Err(err) = std::fs::create_dir_all(&dest) {
        warn!(dest = %dest.display(), error = %err, "could not create destination directory");
    }
    let dest = dest.canonicalize().unwrap_or(dest);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // We can't log via tracing here easily, so fallback to stderr.
                    eprintln!("gust: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("gust: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!(root = %root.display(), debounce_ms = debounce.as_millis() as u64, "file watcher started");

    tokio::spawn(watch_loop(
        root,
        dest,
        bindings,
        event_rx,
        debounce,
        runtime_tx,
    ));

    Ok(WatcherHandle { _inner: watcher })
}

/// Debounce loop: collect matching triggers, flush once a quiet window
/// elapses without further events.
///
/// The loop only sends triggers; it never waits for the triggered build, so
/// new filesystem events are accepted while builds are in flight.
async fn watch_loop(
    root: PathBuf,
    dest: PathBuf,
    bindings: Vec<WatchBinding>,
    mut event_rx: mpsc::UnboundedReceiver<Event>,
    debounce: Duration,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let mut pending: Vec<TaskName> = Vec::new();

    loop {
        let event = if pending.is_empty() {
            match event_rx.recv().await {
                Some(event) => Some(event),
                None => break,
            }
        } else {
            match timeout(debounce, event_rx.recv()).await {
                Ok(Some(event)) => Some(event),
                Ok(None) => {
                    // Channel closed with triggers still pending: flush, then stop.
                    flush_pending(&runtime_tx, &mut pending).await;
                    break;
                }
                Err(_elapsed) => {
                    if !flush_pending(&runtime_tx, &mut pending).await {
                        break;
                    }
                    None
                }
            }
        };

        if let Some(event) = event {
            debug!("received notify event: {:?}", event);
            collect_triggers(&root, &dest, &bindings, &event, &mut pending);
        }
    }

    debug!("file watcher loop ended");
}

/// Send the pending trigger batch to the runtime.
///
/// Returns false if the runtime channel is closed and the loop should stop.
async fn flush_pending(
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    pending: &mut Vec<TaskName>,
) -> bool {
    if pending.is_empty() {
        return true;
    }

    let tasks = std::mem::take(pending);
    debug!(?tasks, "watch triggers coalesced, notifying runtime");

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TasksTriggered {
            tasks,
            reason: TriggerReason::FileWatch,
        })
        .await
    {
        warn!("failed to send watch trigger to runtime: {err}");
        return false;
    }
    true
}

/// Match an event's paths against the bindings, appending newly triggered
/// tasks to `pending` in first-seen order (without duplicates).
fn collect_triggers(
    root: &Path,
    dest: &Path,
    bindings: &[WatchBinding],
    event: &Event,
    pending: &mut Vec<TaskName>,
) {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    if !relevant {
        return;
    }

    for path in &event.paths {
        if path.starts_with(dest) {
            // Build output; rebuilding on it would loop forever.
            continue;
        }
        if has_hidden_component(root, path) {
            continue;
        }

        let rel_str = match path.strip_prefix(root) {
            Ok(rel) => to_slash(rel),
            Err(_) => {
                warn!("could not relativize path {:?} against root {:?}", path, root);
                continue;
            }
        };

        for binding in bindings {
            if binding.matches(&rel_str) {
                for task in binding.tasks() {
                    if !pending.contains(task) {
                        debug!(task = %task, path = %rel_str, "watch match, task triggered");
                        pending.push(task.clone());
                    }
                }
            }
        }
    }
}

/// Returns true if any root-relative component of the path is hidden
/// (starts with a dot). Editor lockfiles and VCS metadata fall out here.
fn has_hidden_component(root: &Path, path: &Path) -> bool {
    let Ok(rel) = path.strip_prefix(root) else {
        return false;
    };
    rel.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
    })
}
