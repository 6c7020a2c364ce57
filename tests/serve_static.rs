// tests/serve_static.rs

mod common;

use std::error::Error;
use std::fs;
use std::net::SocketAddr;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use gust::serve::serve_on;

use crate::common::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

/// Issue a single HTTP/1.1 GET over a raw socket and return (status, body).
async fn http_get(addr: SocketAddr, path: &str) -> Result<(u16, String), Box<dyn Error>> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    let response = String::from_utf8_lossy(&raw);

    let status_line = response.lines().next().unwrap_or_default();
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .ok_or("malformed status line")?
        .parse()?;
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();

    Ok((status, body))
}

#[tokio::test]
async fn serves_files_under_the_destination_directory() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let dest = dir.path().join("dist");
    fs::create_dir_all(dest.join("css"))?;
    fs::write(dest.join("index.html"), "<h1>home</h1>")?;
    fs::write(dest.join("css/site.css"), "body { margin: 0 }")?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(serve_on(listener, dest));

    let (status, body) = http_get(addr, "/css/site.css").await?;
    assert_eq!(status, 200);
    assert_eq!(body, "body { margin: 0 }");

    // The directory root falls through to index.html.
    let (status, body) = http_get(addr, "/").await?;
    assert_eq!(status, 200);
    assert_eq!(body, "<h1>home</h1>");

    let (status, _) = http_get(addr, "/nope.js").await?;
    assert_eq!(status, 404);

    Ok(())
}

#[tokio::test]
async fn serving_reflects_destination_changes() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let dest = dir.path().join("dist");
    fs::create_dir_all(&dest)?;
    fs::write(dest.join("index.html"), "v1")?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(serve_on(listener, dest.clone()));

    let (status, body) = http_get(addr, "/index.html").await?;
    assert_eq!(status, 200);
    assert_eq!(body, "v1");

    // A rebuild overwrites the artifact; the server picks it up on the next
    // request without restarting.
    fs::write(dest.join("index.html"), "v2")?;

    let (status, body) = http_get(addr, "/index.html").await?;
    assert_eq!(status, 200);
    assert_eq!(body, "v2");

    Ok(())
}
