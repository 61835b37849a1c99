//! MIME type lookup by file extension.
//!
//! The table is process-wide, lazily initialized on first use, and never
//! mutated afterwards. Lookups are pure: extension in, media type out.
//! Unknown extensions yield `None`; the HTTP layer omits `Content-Type`
//! in that case.

use std::collections::HashMap;
use std::sync::LazyLock;

use mime::Mime;

/// Extension (lowercase, no dot) to media type.
static MIME_TABLE: LazyLock<HashMap<&'static str, Mime>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    table.insert("html", mime::TEXT_HTML);
    table.insert("htm", mime::TEXT_HTML);
    table.insert("css", mime::TEXT_CSS);
    table.insert("js", mime::TEXT_JAVASCRIPT);
    table.insert("mjs", mime::TEXT_JAVASCRIPT);
    table.insert("json", mime::APPLICATION_JSON);
    table.insert("map", mime::APPLICATION_JSON);
    table.insert("txt", mime::TEXT_PLAIN);
    table.insert("md", mime::TEXT_PLAIN);
    table.insert("xml", mime::TEXT_XML);
    table.insert("csv", mime::TEXT_CSV);
    table.insert("png", mime::IMAGE_PNG);
    table.insert("jpg", mime::IMAGE_JPEG);
    table.insert("jpeg", mime::IMAGE_JPEG);
    table.insert("gif", mime::IMAGE_GIF);
    table.insert("svg", mime::IMAGE_SVG);
    table.insert("bmp", mime::IMAGE_BMP);
    table.insert("woff", mime::FONT_WOFF);
    table.insert("woff2", mime::FONT_WOFF2);
    table.insert("pdf", mime::APPLICATION_PDF);
    table.insert("bin", mime::APPLICATION_OCTET_STREAM);

    // Types the `mime` crate has no named constant for.
    for (ext, value) in [
        ("ico", "image/x-icon"),
        ("webp", "image/webp"),
        ("ttf", "font/ttf"),
        ("otf", "font/otf"),
        ("wasm", "application/wasm"),
        ("zip", "application/zip"),
        ("gz", "application/gzip"),
        ("mp3", "audio/mpeg"),
        ("mp4", "video/mp4"),
        ("webm", "video/webm"),
    ] {
        table.insert(ext, value.parse().expect("static MIME table entry"));
    }

    table
});

/// Look up the media type for a resource path by its extension.
///
/// The extension is taken after the last dot of the last path segment and
/// compared case-insensitively. Returns `None` for paths with no extension
/// or an unrecognized one.
///
/// # Examples
///
/// ```
/// use rustatic_core::mime_types::content_type_for;
///
/// assert_eq!(
///     content_type_for("assets/site.css").map(|m| m.to_string()),
///     Some("text/css".to_owned()),
/// );
/// assert!(content_type_for("README").is_none());
/// ```
#[must_use]
pub fn content_type_for(path: &str) -> Option<Mime> {
    let name = path.rsplit(['/', '\\']).next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    MIME_TABLE.get(ext.to_ascii_lowercase().as_str()).cloned()
}
