//! Request path sanitization.
//!
//! Converts a raw, percent-encoded request path into a safe, base-relative
//! resource path, or rejects it. This is the only barrier between attacker
//! input and the filesystem/archive layer, so the rules are a conservative
//! blacklist applied before any I/O rather than full canonicalization:
//!
//! - percent-decode as UTF-8, falling back to Latin-1 when the bytes are
//!   not valid UTF-8 (decoding never panics);
//! - normalize `\` separators to `/` and strip leading separators;
//! - reject any path that is empty after decoding, contains an empty
//!   segment, or has a segment that starts or ends with a dot. That covers
//!   `..` traversal, `.` self-references, hidden-file names, and Windows
//!   trailing-dot aliases in one rule.

use percent_encoding::percent_decode_str;

/// Sanitize a raw request path into a base-relative resource path.
///
/// Returns `None` when the path must be rejected. The result never starts
/// with a separator and never contains a dot-adjacent segment.
///
/// # Examples
///
/// ```
/// use rustatic_core::sanitize::sanitize;
///
/// assert_eq!(sanitize("/assets/site.css"), Some("assets/site.css".to_owned()));
/// assert_eq!(sanitize("/assets/../etc/passwd"), None);
/// assert_eq!(sanitize("/.git/config"), None);
/// ```
#[must_use]
pub fn sanitize(raw_path: &str) -> Option<String> {
    let decoded = decode_path(raw_path);
    let normalized = decoded.replace('\\', "/");
    let relative = normalized.trim_start_matches('/');

    if relative.is_empty() {
        return None;
    }

    for segment in relative.split('/') {
        if segment.is_empty() || segment.starts_with('.') || segment.ends_with('.') {
            return None;
        }
    }

    Some(relative.to_owned())
}

/// Percent-decode a path, preferring UTF-8 and falling back to Latin-1.
///
/// Legacy clients percent-encode single-byte charsets; mapping each byte to
/// the corresponding `char` recovers those paths instead of failing.
fn decode_path(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(s) => s.into_owned(),
        Err(_) => percent_decode_str(raw).map(char::from).collect(),
    }
}
