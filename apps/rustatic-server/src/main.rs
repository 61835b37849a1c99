//! rustatic server - static file serving over HTTP.
//!
//! Serves a directory or a zip archive over HTTP with conditional-request
//! caching, traversal-safe path handling, and zero-copy transfers on
//! plaintext channels.
//!
//! # Usage
//!
//! ```text
//! RUSTATIC_BASE=file:/srv/www rustatic-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUSTATIC_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `RUSTATIC_BASE` | `file:./public` | Root location (`file:` or `archive:file:...!/prefix`) |
//! | `CACHE_SECONDS` | `60` | Cache window for `Cache-Control` / `Expires` |
//! | `PASS_ON_FAIL` | `false` | Pass unserviceable requests to a fallback handler |
//! | `DIR_INDEXES` | `false` | Reserved, no behavior |
//! | `SECURE_CHANNEL` | `false` | TLS terminated ahead of the listener; use chunked transfers |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use rustatic_core::ServerConfig;
use rustatic_http::response::TransportFailure;
use rustatic_http::{StaticFileService, StaticHttpConfig, classify_hyper_error};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the [`StaticHttpConfig`] from the application [`ServerConfig`].
fn build_http_config(config: &ServerConfig) -> StaticHttpConfig {
    StaticHttpConfig {
        base: config.base.clone(),
        cache_seconds: config.cache_seconds,
        pass_on_fail: config.pass_on_fail,
        secure: config.secure,
        dir_indexes: config.dir_indexes,
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: StaticFileService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        log_connection_error(peer_addr, e.as_ref());
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Log a connection-level failure, quietly for peers that just went away.
fn log_connection_error(peer_addr: SocketAddr, e: &(dyn std::error::Error + Send + Sync + 'static)) {
    match e.downcast_ref::<hyper::Error>().map(classify_hyper_error) {
        Some(TransportFailure::PeerClosed) => {
            debug!(peer_addr = %peer_addr, "peer closed the connection");
        }
        Some(TransportFailure::OversizedRequest) => {
            warn!(peer_addr = %peer_addr, "request exceeded transport size limits");
        }
        _ => {
            error!(peer_addr = %peer_addr, error = %e, "connection error");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env();
    init_tracing(&config.log_level)?;

    if config.dir_indexes {
        warn!("DIR_INDEXES is reserved and has no behavior");
    }

    let service = StaticFileService::new(build_http_config(&config));

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        base = %config.base,
        cache_seconds = config.cache_seconds,
        pass_on_fail = config.pass_on_fail,
        secure = config.secure,
        version = VERSION,
        "starting rustatic server",
    );

    serve(listener, service).await
}
