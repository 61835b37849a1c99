//! Conditional-request evaluation and response caching headers.
//!
//! A request carrying `If-Modified-Since` at or after the resource's
//! modification time short-circuits to a 304; everything else gets the full
//! caching header set derived from the configured cache window. HTTP dates
//! are compared at second granularity, matching the precision of the wire
//! format, and always rendered in GMT regardless of the server's zone.

use chrono::{DateTime, Duration, Utc};

use crate::resource::Resource;

/// Wire format for HTTP dates (`Sun, 06 Nov 1994 08:49:37 GMT`).
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Format a timestamp as an HTTP date in GMT.
#[must_use]
pub fn format_http_date(t: DateTime<Utc>) -> String {
    t.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date header value.
///
/// Accepts the RFC 1123 / 2822 form used by `If-Modified-Since`. Returns
/// `None` for anything unparseable; a malformed conditional header is
/// treated as absent, never as an error.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Headers attached to a fresh (non-304) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshHeaders {
    /// Current time, `Date` header.
    pub date: DateTime<Utc>,
    /// `date` plus the cache window, `Expires` header.
    pub expires: DateTime<Utc>,
    /// Resource modification time when known, `Last-Modified` header.
    pub last_modified: Option<DateTime<Utc>>,
    /// `Cache-Control` header value.
    pub cache_control: String,
    /// Media type when the extension is recognized, `Content-Type` header.
    pub content_type: Option<String>,
    /// Body length when known, `Content-Length` header.
    pub content_length: Option<u64>,
}

/// Outcome of evaluating a request against the caching policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDecision {
    /// The client's copy is current. Answer 304 with a `Date` header only,
    /// no `Content-Length`, and close the connection after the write: a
    /// bodyless response with no explicit length must not be kept alive.
    NotModified,
    /// Serve the resource with the full caching header set.
    Fresh(FreshHeaders),
}

/// Evaluate the caching policy for a resolved resource.
///
/// `if_modified_since` is the raw header value, if any. The comparison is
/// at second granularity: a client timestamp equal to the resource's
/// modification time counts as current.
#[must_use]
pub fn evaluate(
    resource: &Resource,
    if_modified_since: Option<&str>,
    cache_seconds: u32,
    now: DateTime<Utc>,
) -> CacheDecision {
    let last_modified = resource.last_modified();

    if let (Some(header), Some(modified)) =
        (if_modified_since.and_then(parse_http_date), last_modified)
    {
        if header.timestamp() >= modified.timestamp() {
            return CacheDecision::NotModified;
        }
    }

    CacheDecision::Fresh(FreshHeaders {
        date: now,
        expires: now + Duration::seconds(i64::from(cache_seconds)),
        last_modified,
        cache_control: format!("private, max-age={cache_seconds}"),
        content_type: resource.content_type(),
        content_length: resource.content_length(),
    })
}
