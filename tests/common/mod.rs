// tests/common/mod.rs

// Shared across test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::error::Error;
use std::sync::Once;

use tokio::time::{sleep, timeout, Duration};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Poll `cond` until it holds or a 5 second deadline passes.
///
/// Used for assertions against work that runs on spawned tasks (builds,
/// watcher triggers), where there is no handle to await directly.
pub async fn wait_until<F: Fn() -> bool>(what: &str, cond: F) -> Result<(), Box<dyn Error>> {
    let result = timeout(Duration::from_secs(5), async {
        loop {
            if cond() {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await;

    result.map_err(|_| format!("timed out waiting for {what}").into())
}
