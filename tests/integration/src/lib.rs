//! Integration tests for the rustatic server.
//!
//! Each test spawns the real [`StaticFileService`] behind a hyper
//! connection loop on an ephemeral port, over tempdir/zip fixtures, and
//! drives it with `reqwest` or a raw TCP socket (for connection-close
//! assertions the client library hides).

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use rustatic_http::{StaticFileService, StaticHttpConfig};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A spawned test server; the accept loop is aborted on drop.
#[derive(Debug)]
pub struct TestServer {
    /// Bound address of the server.
    pub addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    /// URL for a request path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

/// Spawn the static file service on an ephemeral port.
pub async fn spawn_server(config: StaticHttpConfig) -> TestServer {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let service = StaticFileService::new(config);

    let handle = tokio::spawn(async move {
        let http = HttpConnBuilder::new(TokioExecutor::new());
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let conn = http
                .serve_connection(TokioIo::new(stream), service.clone())
                .into_owned();
            tokio::spawn(async move {
                let _ = conn.await;
            });
        }
    });

    TestServer { addr, handle }
}

/// Build a directory fixture with a few known assets.
#[must_use]
pub fn fixture_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("assets")).expect("mkdir assets");
    std::fs::write(dir.path().join("assets/foo.css"), "* { margin:0; }").expect("write css");
    std::fs::write(dir.path().join("index.html"), "<html></html>").expect("write html");
    std::fs::write(dir.path().join("data.xyzzy"), "opaque").expect("write unknown");
    dir
}

/// Write a zip archive fixture containing `assets/foo.css`.
#[must_use]
pub fn fixture_archive(dir: &Path) -> PathBuf {
    let path = dir.join("bundle.zip");
    let file = std::fs::File::create(&path).expect("create archive");
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    writer
        .start_file("assets/foo.css", options)
        .expect("start entry");
    writer.write_all(b"* { margin:0; }").expect("write entry");
    writer.finish().expect("finish archive");
    path
}

/// Service configuration rooted at a fixture directory.
#[must_use]
pub fn file_config(dir: &Path) -> StaticHttpConfig {
    StaticHttpConfig {
        base: format!("file:{}", dir.display()),
        ..StaticHttpConfig::default()
    }
}

/// Send a raw HTTP request and collect the response bytes.
///
/// Reads until the server closes the connection or `timeout` passes.
/// Returns the raw response and whether EOF was reached, which is how
/// the tests observe connection-close policy.
pub async fn raw_request(
    addr: SocketAddr,
    request: &str,
    timeout: Duration,
) -> (Vec<u8>, bool) {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut response = Vec::new();
    let mut buf = [0u8; 4096];
    let eof = loop {
        match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break true,
            Ok(Ok(n)) => response.extend_from_slice(&buf[..n]),
            Ok(Err(_)) | Err(_) => break false,
        }
    };

    (response, eof)
}

mod test_conditional;
mod test_errors;
mod test_serve;
