//! The static file service implementing hyper's `Service` trait.
//!
//! [`StaticFileService`] ties the pipeline together. Each request passes
//! through:
//!
//! 1. Health check interception (`GET /_health`)
//! 2. Oversized-request guard
//! 3. Method filter (only GET and HEAD are served)
//! 4. Path sanitization
//! 5. Resource resolution
//! 6. Caching policy (304 short-circuit)
//! 7. Header write, then body transfer for GET
//! 8. Connection-close policy from the request's keep-alive
//!
//! Unserviceable requests (bad method, rejected path, absent resource,
//! non-file resource) are either answered directly or, when the
//! pass-on-fail policy is enabled and a fallback is installed, handed to
//! the next handler in the chain.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, warn};

use rustatic_core::caching::{self, CacheDecision};
use rustatic_core::sanitize::sanitize;
use rustatic_core::{ResourceBase, ServeError};

use crate::body::StaticBody;
use crate::response::{self, TransportFailure};
use crate::transfer::{TransferHandle, TransferOutcome, start_transfer};

/// Upper bound on the request target (path plus query). Anything longer
/// is answered with a plain 400 and a closed connection.
const MAX_TARGET_BYTES: usize = 8 * 1024;

/// Configuration for the static file service.
#[derive(Debug, Clone)]
pub struct StaticHttpConfig {
    /// Root location, a `file:` or `archive:file:...!/prefix` URL.
    pub base: String,
    /// Cache window in seconds for `Cache-Control` / `Expires`.
    pub cache_seconds: u32,
    /// Pass unserviceable requests to the fallback instead of answering.
    pub pass_on_fail: bool,
    /// Channel security mode; selects the chunked transfer path.
    pub secure: bool,
    /// Reserved, accepted but never acted on.
    pub dir_indexes: bool,
}

impl Default for StaticHttpConfig {
    fn default() -> Self {
        Self {
            base: "file:./public".to_owned(),
            cache_seconds: 60,
            pass_on_fail: false,
            secure: false,
            dir_indexes: false,
        }
    }
}

/// Next handler in the dispatch chain, consulted when the pass-on-fail
/// policy declines a request.
pub trait FallbackHandler: Send + Sync + 'static {
    /// Handle a request this service declined to serve.
    fn handle(
        &self,
        parts: http::request::Parts,
    ) -> Pin<Box<dyn Future<Output = http::Response<StaticBody>> + Send>>;
}

/// The static file service.
///
/// Cheap to clone; configuration and the parsed base are shared.
pub struct StaticFileService {
    base: Arc<ResourceBase>,
    config: Arc<StaticHttpConfig>,
    fallback: Option<Arc<dyn FallbackHandler>>,
}

impl std::fmt::Debug for StaticFileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFileService")
            .field("base", &self.base)
            .field("config", &self.config)
            .field("fallback", &self.fallback.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Clone for StaticFileService {
    fn clone(&self) -> Self {
        Self {
            base: Arc::clone(&self.base),
            config: Arc::clone(&self.config),
            fallback: self.fallback.clone(),
        }
    }
}

impl StaticFileService {
    /// Create a service from its configuration.
    #[must_use]
    pub fn new(config: StaticHttpConfig) -> Self {
        let base = ResourceBase::parse(&config.base);
        Self {
            base: Arc::new(base),
            config: Arc::new(config),
            fallback: None,
        }
    }

    /// Install the next handler in the dispatch chain.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackHandler>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl Service<http::Request<Incoming>> for StaticFileService {
    type Response = http::Response<StaticBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let base = Arc::clone(&self.base);
        let config = Arc::clone(&self.config);
        let fallback = self.fallback.clone();

        Box::pin(async move {
            // GET/HEAD requests carry no body worth reading.
            let (parts, _body) = req.into_parts();
            Ok(process_request(&base, &config, fallback.as_deref(), parts).await)
        })
    }
}

/// Process one request through the serving pipeline.
async fn process_request(
    base: &ResourceBase,
    config: &StaticHttpConfig,
    fallback: Option<&dyn FallbackHandler>,
    parts: http::request::Parts,
) -> http::Response<StaticBody> {
    let method = parts.method.clone();
    let uri = parts.uri.clone();
    debug!(%method, %uri, "processing request");

    // 1. Health check interception.
    if is_health_check(&method, uri.path()) {
        return health_check_response();
    }

    // 2. Oversized request target.
    let target_len = uri.path_and_query().map_or(0, |pq| pq.as_str().len());
    if target_len > MAX_TARGET_BYTES {
        warn!(%method, target_len, "request target exceeds size limit");
        return translate_or_500(&TransportFailure::OversizedRequest);
    }

    match serve(base, config, &parts).await {
        Ok(resp) => resp,
        Err(err) if is_unserved(&err) => {
            if config.pass_on_fail {
                if let Some(next) = fallback {
                    debug!(%method, %uri, error = %err, "passing request to the next handler");
                    return next.handle(parts).await;
                }
            }
            answer_unserved(&err)
        }
        Err(err) => {
            error!(%method, %uri, error = %err, "request failed");
            translate_or_500(&TransportFailure::Unexpected(anyhow::anyhow!("{err}")))
        }
    }
}

/// Serve a GET/HEAD request for a static resource.
async fn serve(
    base: &ResourceBase,
    config: &StaticHttpConfig,
    parts: &http::request::Parts,
) -> Result<http::Response<StaticBody>, ServeError> {
    // 3. Method filter: only idempotent methods reach the resource layer.
    let head_only = if parts.method == http::Method::GET {
        false
    } else if parts.method == http::Method::HEAD {
        true
    } else {
        return Err(ServeError::MethodNotServed {
            method: parts.method.to_string(),
        });
    };

    // 4. Sanitize the raw path before any I/O.
    let raw_path = parts.uri.path();
    let Some(relative) = sanitize(raw_path) else {
        return Err(ServeError::UnsafePath {
            path: raw_path.to_owned(),
        });
    };

    // 5. Resolve the resource.
    let resource = base.resolve(&relative).await;
    if !resource.exists() {
        return Err(ServeError::Absent { path: relative });
    }
    if !resource.is_file() {
        return Err(ServeError::NotAFile { path: relative });
    }

    // 6. Caching policy.
    let if_modified_since = parts
        .headers
        .get(http::header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok());
    let now = Utc::now();
    let headers = match caching::evaluate(&resource, if_modified_since, config.cache_seconds, now)
    {
        CacheDecision::NotModified => {
            debug!(path = %resource.path(), "client copy is current");
            return Ok(response::not_modified(now));
        }
        CacheDecision::Fresh(headers) => headers,
    };

    // 7. Headers, then the body for GET.
    let mut builder = response::apply_fresh_headers(
        http::Response::builder().status(http::StatusCode::OK),
        &headers,
    );
    if !wants_keep_alive(parts) {
        builder = builder.header("Connection", "close");
    }

    if head_only {
        return builder
            .body(StaticBody::empty())
            .map_err(|e| ServeError::Internal(anyhow::anyhow!("response build failed: {e}")));
    }

    let stream = match resource.open().await {
        Ok(stream) => stream,
        // Vanished between the existence probe and the open.
        Err(err) if err.is_vanished() => {
            return Err(ServeError::Absent {
                path: resource.path(),
            });
        }
        Err(err) => return Err(err),
    };

    let (body, handle) = start_transfer(stream, config.secure);

    // 8. Observe the transfer outcome out-of-band.
    tokio::spawn(log_transfer_outcome(resource.path(), handle));

    builder
        .body(body)
        .map_err(|e| ServeError::Internal(anyhow::anyhow!("response build failed: {e}")))
}

/// Whether the error is a business-level decline subject to pass-on-fail.
fn is_unserved(err: &ServeError) -> bool {
    matches!(
        err,
        ServeError::MethodNotServed { .. }
            | ServeError::UnsafePath { .. }
            | ServeError::Absent { .. }
            | ServeError::NotAFile { .. }
    )
}

/// Answer a declined request directly.
fn answer_unserved(err: &ServeError) -> http::Response<StaticBody> {
    match err {
        ServeError::MethodNotServed { method } => {
            debug!(%method, "rejecting non-idempotent method");
            response::bad_request("only GET and HEAD are served")
        }
        ServeError::UnsafePath { path } => {
            warn!(path = %path, "rejected unsafe request path");
            response::forbidden()
        }
        ServeError::NotAFile { path } => {
            debug!(path = %path, "resource is not a regular file");
            response::forbidden()
        }
        ServeError::Absent { path } => {
            debug!(path = %path, "resource not found");
            response::not_found()
        }
        _ => response::internal_error("internal server error"),
    }
}

/// Translate a transport failure, falling back to a bare 500 when the
/// translation declines to answer.
fn translate_or_500(failure: &TransportFailure) -> http::Response<StaticBody> {
    response::translate_failure(failure)
        .unwrap_or_else(|| response::internal_error("internal server error"))
}

/// Connection persistence requested by the client.
///
/// HTTP/1.1 defaults to keep-alive unless `Connection: close`; HTTP/1.0
/// defaults to close unless `Connection: keep-alive`.
fn wants_keep_alive(parts: &http::request::Parts) -> bool {
    let connection = parts
        .headers
        .get(http::header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if parts.version == http::Version::HTTP_10 {
        connection.eq_ignore_ascii_case("keep-alive")
    } else {
        !connection.eq_ignore_ascii_case("close")
    }
}

/// Log how a transfer ended once its handle resolves.
async fn log_transfer_outcome(path: String, handle: TransferHandle) {
    match handle.await {
        TransferOutcome::Completed { bytes } => {
            debug!(path = %path, bytes, "transfer complete");
        }
        TransferOutcome::Aborted { bytes } => {
            debug!(path = %path, bytes, "peer stopped reading mid-transfer");
        }
        TransferOutcome::Failed { bytes } => {
            warn!(path = %path, bytes, "transfer failed mid-stream");
        }
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/_health" || path == "/health")
}

/// Produce a health check response.
fn health_check_response() -> http::Response<StaticBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(StaticBody::from_string(
            r#"{"status":"running","service":"static"}"#,
        ))
        .expect("static health response should be valid")
}
