// src/serve/mod.rs

//! Local static-file server for the destination directory.
//!
//! A thin wrapper over axum + tower-http: the destination directory is the
//! document root, nothing else is mounted. The server's lifecycle is
//! independent of the watch/build side; the two share only the directory on
//! disk, so a request racing a rebuild simply sees whichever bytes are
//! there at that moment.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

use crate::errors::Result;

/// Bind and serve `dest` over HTTP until the surrounding task is dropped.
///
/// The directory does not have to exist yet; requests arriving before the
/// first build simply get 404s.
pub async fn serve(dest: PathBuf, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding dev server to {addr}"))?;

    info!(addr = %addr, dest = %dest.display(), "dev server listening");
    serve_on(listener, dest).await
}

/// Serve `dest` on an already-bound listener.
///
/// Split out from [`serve`] so callers can bind an ephemeral port first and
/// read the actual address back.
pub async fn serve_on(listener: TcpListener, dest: PathBuf) -> Result<()> {
    let app = Router::new().fallback_service(ServeDir::new(dest));

    axum::serve(listener, app)
        .await
        .context("dev server terminated")?;
    Ok(())
}
