//! Response assembly and transport-failure translation.
//!
//! Builds the header sets for fresh, not-modified, and error responses,
//! and maps transport-level failures onto wire behavior independent of the
//! serving pipeline's own business branches:
//!
//! | condition | action |
//! |---|---|
//! | peer already gone | log only, no response attempted |
//! | oversized request target | 400, plain text, close |
//! | any other uncaught failure | 500, plain text, close |

use chrono::{DateTime, Utc};
use http::header::HeaderValue;

use rustatic_core::FreshHeaders;
use rustatic_core::caching::format_http_date;

use crate::body::StaticBody;

/// Content type for plain-text error bodies.
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

// ---------------------------------------------------------------------------
// Header helpers
// ---------------------------------------------------------------------------

/// Set a header if the value renders to a valid header value.
fn set_header(
    builder: http::response::Builder,
    name: &str,
    value: &str,
) -> http::response::Builder {
    if let Ok(hv) = HeaderValue::from_str(value) {
        return builder.header(name, hv);
    }
    builder
}

/// Set an HTTP date header.
fn set_date_header(
    builder: http::response::Builder,
    name: &str,
    value: DateTime<Utc>,
) -> http::response::Builder {
    set_header(builder, name, &format_http_date(value))
}

/// Apply the full caching header set of a fresh response.
#[must_use]
pub fn apply_fresh_headers(
    mut builder: http::response::Builder,
    headers: &FreshHeaders,
) -> http::response::Builder {
    builder = set_date_header(builder, "Date", headers.date);
    builder = set_date_header(builder, "Expires", headers.expires);
    if let Some(modified) = headers.last_modified {
        builder = set_date_header(builder, "Last-Modified", modified);
    }
    builder = set_header(builder, "Cache-Control", &headers.cache_control);
    if let Some(ref content_type) = headers.content_type {
        builder = set_header(builder, "Content-Type", content_type);
    }
    if let Some(length) = headers.content_length {
        builder = builder.header("Content-Length", length);
    }
    builder
}

// ---------------------------------------------------------------------------
// Terminal responses
// ---------------------------------------------------------------------------

/// 304 response: a `Date` header only, no length, connection closed.
#[must_use]
pub fn not_modified(now: DateTime<Utc>) -> http::Response<StaticBody> {
    set_date_header(
        http::Response::builder()
            .status(http::StatusCode::NOT_MODIFIED)
            .header("Connection", "close"),
        "Date",
        now,
    )
    .body(StaticBody::empty())
    .expect("static 304 response should be valid")
}

/// 400 response with a plain-text body; always closes.
#[must_use]
pub fn bad_request(message: &str) -> http::Response<StaticBody> {
    http::Response::builder()
        .status(http::StatusCode::BAD_REQUEST)
        .header("Content-Type", TEXT_PLAIN)
        .header("Connection", "close")
        .body(StaticBody::from_string(message))
        .expect("static 400 response should be valid")
}

/// 403 response, no body.
#[must_use]
pub fn forbidden() -> http::Response<StaticBody> {
    http::Response::builder()
        .status(http::StatusCode::FORBIDDEN)
        .body(StaticBody::empty())
        .expect("static 403 response should be valid")
}

/// 404 response, no body.
#[must_use]
pub fn not_found() -> http::Response<StaticBody> {
    http::Response::builder()
        .status(http::StatusCode::NOT_FOUND)
        .body(StaticBody::empty())
        .expect("static 404 response should be valid")
}

/// 500 response with a plain-text body; always closes.
#[must_use]
pub fn internal_error(message: &str) -> http::Response<StaticBody> {
    http::Response::builder()
        .status(http::StatusCode::INTERNAL_SERVER_ERROR)
        .header("Content-Type", TEXT_PLAIN)
        .header("Connection", "close")
        .body(StaticBody::from_string(message))
        .expect("static 500 response should be valid")
}

// ---------------------------------------------------------------------------
// Transport-failure translation
// ---------------------------------------------------------------------------

/// A failure at the transport layer, outside the serving pipeline's
/// business branches.
#[derive(Debug)]
pub enum TransportFailure {
    /// The peer is gone; nothing can be written.
    PeerClosed,
    /// The request line or headers exceeded the size limit.
    OversizedRequest,
    /// Anything else that escaped the pipeline.
    Unexpected(anyhow::Error),
}

/// Classify a hyper connection error into a transport failure.
#[must_use]
pub fn classify_hyper_error(e: &hyper::Error) -> TransportFailure {
    if e.is_parse_too_large() {
        return TransportFailure::OversizedRequest;
    }
    if e.is_incomplete_message() || e.is_canceled() {
        return TransportFailure::PeerClosed;
    }
    TransportFailure::Unexpected(anyhow::anyhow!("{e}"))
}

/// Translate a transport failure into a response, if one can be written.
///
/// Returns `None` when the peer is already gone; the caller logs and moves
/// on rather than writing into a closed channel.
#[must_use]
pub fn translate_failure(failure: &TransportFailure) -> Option<http::Response<StaticBody>> {
    match failure {
        TransportFailure::PeerClosed => None,
        TransportFailure::OversizedRequest => Some(bad_request("request too large")),
        TransportFailure::Unexpected(_) => Some(internal_error("internal server error")),
    }
}
