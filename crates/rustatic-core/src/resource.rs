//! The servable resource model.
//!
//! A [`Resource`] is a closed set of variants over the backing stores this
//! server knows how to stream: a filesystem file, an entry inside a zip
//! archive, or nothing at all. Resolution from a [`ResourceBase`] never
//! fails observably: malformed locations, unreadable files, and archive
//! I/O errors all degrade to a resource that does not exist.
//!
//! Metadata (existence, length, modification time) is probed once at
//! resolution and snapshotted on the resource; probes run off the calling
//! task's executor thread via `tokio::fs` and `spawn_blocking`, so the
//! event loop never blocks on filesystem latency. The native handle for
//! body transfer is acquired separately, by [`Resource::open`], and only
//! released when the transfer completes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::error::{ServeError, ServeResult};
use crate::mime_types;

// ---------------------------------------------------------------------------
// ResourceBase
// ---------------------------------------------------------------------------

/// A parsed base location that request paths resolve against.
///
/// `file:` bases resolve to filesystem lookups under a root directory;
/// `archive:file:...!/prefix` bases resolve to entry lookups inside a zip
/// archive. Anything else resolves every path to [`Resource::Empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceBase {
    /// Serve files under a root directory.
    Directory {
        /// The root directory.
        root: PathBuf,
    },
    /// Serve entries of a zip archive, under an optional entry prefix.
    Archive {
        /// Path to the archive on disk.
        archive: PathBuf,
        /// Entry-name prefix inside the archive; empty serves the whole
        /// archive.
        prefix: String,
    },
    /// A malformed or unsupported base; resolves everything to Empty.
    Unresolvable,
}

impl ResourceBase {
    /// Parse a base location URL.
    ///
    /// Accepted forms are `file:/path/to/root` (with optional `//`) and
    /// `archive:file:/path/to/app.zip!/prefix`. Parsing never fails; a
    /// malformed base yields [`ResourceBase::Unresolvable`].
    #[must_use]
    pub fn parse(base: &str) -> Self {
        if let Some(rest) = base.strip_prefix("archive:") {
            let Some(inner) = rest.strip_prefix("file:") else {
                debug!(base, "unsupported inner scheme for archive base");
                return Self::Unresolvable;
            };
            let Some((archive, prefix)) = inner.split_once("!/") else {
                debug!(base, "archive base is missing the !/ entry separator");
                return Self::Unresolvable;
            };
            return Self::Archive {
                archive: PathBuf::from(strip_authority(archive)),
                prefix: prefix.trim_matches('/').to_owned(),
            };
        }

        if let Some(rest) = base.strip_prefix("file:") {
            return Self::Directory {
                root: PathBuf::from(strip_authority(rest)),
            };
        }

        debug!(base, "unsupported base scheme");
        Self::Unresolvable
    }

    /// Resolve a sanitized, base-relative path to a resource.
    ///
    /// Never fails: every error degrades to a resource whose `exists` is
    /// false, or to [`Resource::Empty`] for an unresolvable base.
    pub async fn resolve(&self, relative: &str) -> Resource {
        match self {
            Self::Directory { root } => FileResource::probe(root.join(relative)).await,
            Self::Archive { archive, prefix } => {
                ArchiveEntryResource::probe(archive.clone(), join_entry(prefix, relative)).await
            }
            Self::Unresolvable => Resource::Empty,
        }
    }
}

/// Strip the empty authority of a `file://` URL, keeping the path.
fn strip_authority(path: &str) -> &str {
    path.strip_prefix("//").unwrap_or(path)
}

/// Join an archive entry prefix with a relative path.
fn join_entry(prefix: &str, relative: &str) -> String {
    if prefix.is_empty() {
        relative.to_owned()
    } else {
        format!("{prefix}/{relative}")
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A servable resource: file, archive entry, or absent.
///
/// Metadata accessors read the snapshot taken at resolution time. A
/// resource that does not exist, or is not a regular file, must not be
/// opened; [`Resource::Empty`] enforces this with an illegal-state error.
#[derive(Debug, Clone)]
pub enum Resource {
    /// A file on the local filesystem.
    File(FileResource),
    /// An entry inside a zip archive.
    ArchiveEntry(ArchiveEntryResource),
    /// No backing resource.
    Empty,
}

/// A filesystem-backed resource.
#[derive(Debug, Clone)]
pub struct FileResource {
    disk_path: PathBuf,
    exists: bool,
    is_file: bool,
    len: Option<u64>,
    modified: Option<DateTime<Utc>>,
}

/// A zip-archive-entry-backed resource.
#[derive(Debug, Clone)]
pub struct ArchiveEntryResource {
    archive: PathBuf,
    /// Entry name as stored in the archive (used for lookup at open time).
    entry_name: String,
    exists: bool,
    is_file: bool,
    len: Option<u64>,
    modified: Option<DateTime<Utc>>,
}

impl Resource {
    /// Whether the resource exists. Hidden files and failed probes report
    /// false.
    #[must_use]
    pub fn exists(&self) -> bool {
        match self {
            Self::File(f) => f.exists,
            Self::ArchiveEntry(a) => a.exists,
            Self::Empty => false,
        }
    }

    /// Whether the resource is a regular file. Directories and archive
    /// namespaces report false and are never served.
    #[must_use]
    pub fn is_file(&self) -> bool {
        match self {
            Self::File(f) => f.is_file,
            Self::ArchiveEntry(a) => a.is_file,
            Self::Empty => false,
        }
    }

    /// Modification time, when known.
    #[must_use]
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::File(f) => f.modified,
            Self::ArchiveEntry(a) => a.modified,
            Self::Empty => None,
        }
    }

    /// Body length in bytes, when known.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::File(f) => f.len,
            Self::ArchiveEntry(a) => a.len,
            Self::Empty => None,
        }
    }

    /// Media type derived from the resource's extension; `None` when the
    /// extension is unrecognized.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        let name = match self {
            Self::File(f) => f.disk_path.to_string_lossy().into_owned(),
            Self::ArchiveEntry(a) => a.entry_name.clone(),
            Self::Empty => return None,
        };
        mime_types::content_type_for(&name).map(|m| m.to_string())
    }

    /// Canonical external form of the resource location.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::File(f) => format!("file:{}", f.disk_path.display()),
            Self::ArchiveEntry(a) => format!(
                "archive:file:{}!/{}",
                a.archive.display(),
                a.entry_name.replace('\\', "/"),
            ),
            Self::Empty => String::new(),
        }
    }

    /// Compose a child resource from this resource and a sub-path.
    ///
    /// Empty composes to Empty; the others re-probe under the joined
    /// location.
    pub async fn child(&self, relative: &str) -> Resource {
        match self {
            Self::File(f) => FileResource::probe(f.disk_path.join(relative)).await,
            Self::ArchiveEntry(a) => {
                let entry = join_entry(a.entry_name.trim_end_matches('/'), relative);
                ArchiveEntryResource::probe(a.archive.clone(), entry).await
            }
            Self::Empty => Resource::Empty,
        }
    }

    /// Acquire the native handle for a body transfer.
    ///
    /// The handle stays open until the transfer completes; release is the
    /// transfer layer's responsibility. A file that vanished between the
    /// existence probe and this call surfaces as a not-found I/O error.
    ///
    /// # Errors
    ///
    /// [`ServeError::IllegalState`] for [`Resource::Empty`] — callers must
    /// check `exists` and `is_file` first. [`ServeError::Io`] when the
    /// backing file cannot be opened.
    pub async fn open(&self) -> ServeResult<ResourceStream> {
        match self {
            Self::File(f) => {
                let file = tokio::fs::File::open(&f.disk_path).await?;
                Ok(ResourceStream::File {
                    file,
                    len: f.len.unwrap_or(0),
                })
            }
            Self::ArchiveEntry(a) => Ok(ResourceStream::ArchiveEntry {
                archive: a.archive.clone(),
                entry_name: a.entry_name.clone(),
                len: a.len.unwrap_or(0),
            }),
            Self::Empty => Err(ServeError::IllegalState {
                message: "open() called on an empty resource".to_owned(),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn probed_file_for_tests(
        path: &str,
        len: u64,
        modified: Option<DateTime<Utc>>,
    ) -> Self {
        Self::File(FileResource {
            disk_path: PathBuf::from(path),
            exists: true,
            is_file: true,
            len: Some(len),
            modified,
        })
    }
}

impl FileResource {
    /// Probe a filesystem path into a resource snapshot.
    async fn probe(disk_path: PathBuf) -> Resource {
        let hidden = disk_path
            .file_name()
            .is_none_or(|n| n.to_string_lossy().starts_with('.'));

        match tokio::fs::metadata(&disk_path).await {
            Ok(meta) => {
                let modified = meta.modified().ok().map(DateTime::<Utc>::from);
                Resource::File(Self {
                    disk_path,
                    // Hidden files are intentionally invisible.
                    exists: !hidden,
                    is_file: meta.is_file(),
                    len: Some(meta.len()),
                    modified,
                })
            }
            Err(e) => {
                trace!(path = %disk_path.display(), error = %e, "file probe failed");
                Resource::File(Self {
                    disk_path,
                    exists: false,
                    is_file: false,
                    len: None,
                    modified: None,
                })
            }
        }
    }
}

impl ArchiveEntryResource {
    /// Probe an archive entry into a resource snapshot.
    ///
    /// The scan opens the archive on the blocking pool and looks for an
    /// exact name match after normalizing separators. Entries ending in a
    /// separator are directories. Every archive I/O failure is caught and
    /// reported as absence.
    async fn probe(archive: PathBuf, entry: String) -> Resource {
        let normalized = entry.replace('\\', "/");
        let scan_archive_path = archive.clone();
        let scan_entry = normalized.clone();

        let scan = tokio::task::spawn_blocking(move || {
            scan_for_entry(&scan_archive_path, &scan_entry)
        })
        .await
        .unwrap_or(EntryScan::Absent);

        match scan {
            EntryScan::File { raw_name, len } => {
                let modified = archive_modified(&archive);
                Resource::ArchiveEntry(Self {
                    archive,
                    entry_name: raw_name,
                    exists: true,
                    is_file: true,
                    len: Some(len),
                    modified,
                })
            }
            EntryScan::Directory { raw_name } => {
                let modified = archive_modified(&archive);
                Resource::ArchiveEntry(Self {
                    archive,
                    entry_name: raw_name,
                    exists: true,
                    is_file: false,
                    len: None,
                    modified,
                })
            }
            EntryScan::Absent => Resource::ArchiveEntry(Self {
                archive,
                entry_name: normalized,
                exists: false,
                is_file: false,
                len: None,
                modified: None,
            }),
        }
    }
}

/// Outcome of scanning an archive for one entry.
enum EntryScan {
    File { raw_name: String, len: u64 },
    Directory { raw_name: String },
    Absent,
}

/// Scan the archive's directory for an exact entry match.
fn scan_for_entry(archive: &Path, entry: &str) -> EntryScan {
    let file = match std::fs::File::open(archive) {
        Ok(f) => f,
        Err(e) => {
            trace!(archive = %archive.display(), error = %e, "cannot open archive");
            return EntryScan::Absent;
        }
    };
    let mut zip = match zip::ZipArchive::new(file) {
        Ok(z) => z,
        Err(e) => {
            trace!(archive = %archive.display(), error = %e, "cannot read archive directory");
            return EntryScan::Absent;
        }
    };

    let dir_form = format!("{entry}/");
    let mut matched: Option<(String, bool)> = None;
    for name in zip.file_names() {
        let normalized = name.replace('\\', "/");
        if normalized == entry {
            matched = Some((name.to_owned(), normalized.ends_with('/')));
            break;
        }
        if normalized == dir_form {
            matched = Some((name.to_owned(), true));
            break;
        }
    }

    match matched {
        Some((raw_name, true)) => EntryScan::Directory { raw_name },
        Some((raw_name, false)) => match zip.by_name(&raw_name) {
            Ok(entry_file) => EntryScan::File {
                len: entry_file.size(),
                raw_name,
            },
            Err(e) => {
                trace!(archive = %archive.display(), error = %e, "cannot stat archive entry");
                EntryScan::Absent
            }
        },
        None => EntryScan::Absent,
    }
}

/// Modification time for archive entries: the archive file itself.
///
/// An entry cannot be newer than the archive that carries it, so the
/// archive's mtime gives correct conditional-request semantics without
/// decoding per-entry timestamps.
fn archive_modified(archive: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(archive)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

// ---------------------------------------------------------------------------
// ResourceStream
// ---------------------------------------------------------------------------

/// An acquired native handle, ready for body transfer.
#[derive(Debug)]
pub enum ResourceStream {
    /// An open file descriptor and the length the response was sized to.
    File {
        /// The open file.
        file: tokio::fs::File,
        /// Byte length the transfer will move.
        len: u64,
    },
    /// An archive entry locator; the archive is opened by the transfer
    /// pump on the blocking pool.
    ArchiveEntry {
        /// Path to the archive on disk.
        archive: PathBuf,
        /// Entry name as stored in the archive.
        entry_name: String,
        /// Byte length the transfer will move.
        len: u64,
    },
}

impl ResourceStream {
    /// Byte length the transfer will move.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::File { len, .. } | Self::ArchiveEntry { len, .. } => *len,
        }
    }

    /// Whether the stream carries no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
