//! Body transfer strategies and completion tracking.
//!
//! [`start_transfer`] turns an acquired [`ResourceStream`] into a response
//! body plus a [`TransferHandle`], choosing the path by the channel's
//! security mode:
//!
//! - **Plaintext file**: whole-file region frames read straight from the
//!   descriptor ([`REGION_FRAME_BYTES`]), the zero-copy path. Nothing
//!   between the descriptor and the socket re-buffers the data.
//! - **Encrypted file**: reads through a small fixed buffer
//!   ([`CHUNK_BYTES`]) so the encryption layer in front of the sink sees
//!   every byte.
//! - **Archive entry**: always chunked, regardless of the security mode —
//!   decompression yields no descriptor to hand over. A blocking task
//!   pumps frames through a bounded single-slot channel.
//!
//! Completion is exactly-once on every exit path: success, stream error,
//! and peer disconnect (the body is dropped mid-transfer) all fire the
//! same [`ReleaseGuard`], and the native handle is closed with it. Close
//! errors are swallowed; cleanup is best-effort and never reaches the
//! caller.

use std::future::Future;
use std::io::{self, Read};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;

use rustatic_core::ResourceStream;

use crate::body::{ChannelBody, FileBody, StaticBody};

/// Frame size for the plaintext region path: large frames straight off
/// the descriptor.
pub const REGION_FRAME_BYTES: usize = 512 * 1024;

/// Buffer size for the chunked path (encrypted channels, archive entries).
pub const CHUNK_BYTES: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Completion tracking
// ---------------------------------------------------------------------------

/// How a transfer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Every byte reached the sink.
    Completed {
        /// Bytes moved.
        bytes: u64,
    },
    /// The stream failed mid-transfer.
    Failed {
        /// Bytes moved before the failure.
        bytes: u64,
    },
    /// The peer stopped reading before the transfer finished.
    Aborted {
        /// Bytes moved before the abort.
        bytes: u64,
    },
}

/// One-shot completion token for an in-flight body transfer.
///
/// Resolves when the transfer finishes, fails, or is abandoned. By the
/// time it resolves, the native resource behind the transfer has been
/// released.
#[derive(Debug)]
pub struct TransferHandle {
    rx: oneshot::Receiver<TransferOutcome>,
}

impl Future for TransferHandle {
    type Output = TransferOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or(TransferOutcome::Aborted { bytes: 0 }))
    }
}

/// Fires the transfer outcome exactly once, on drop at the latest.
///
/// The guard travels with whichever side owns the native handle (the body
/// for files, the pump for archive entries); dropping that owner without
/// an explicit completion reports an aborted transfer.
#[derive(Debug)]
pub struct ReleaseGuard {
    tx: Option<oneshot::Sender<TransferOutcome>>,
    bytes: u64,
}

impl ReleaseGuard {
    fn new() -> (Self, TransferHandle) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Some(tx),
                bytes: 0,
            },
            TransferHandle { rx },
        )
    }

    /// Record bytes moved toward the sink.
    pub(crate) fn add_bytes(&mut self, n: u64) {
        self.bytes += n;
    }

    /// Mark the transfer complete.
    pub(crate) fn complete_ok(&mut self) {
        self.fire(TransferOutcome::Completed { bytes: self.bytes });
    }

    /// Mark the transfer failed.
    pub(crate) fn complete_failed(&mut self) {
        self.fire(TransferOutcome::Failed { bytes: self.bytes });
    }

    fn fire(&mut self, outcome: TransferOutcome) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.fire(TransferOutcome::Aborted { bytes: self.bytes });
    }
}

// ---------------------------------------------------------------------------
// Transfer start
// ---------------------------------------------------------------------------

/// Start a body transfer for an acquired resource stream.
///
/// Returns the response body and the completion handle. The caller applies
/// connection-close policy after the handle resolves; this layer only
/// moves bytes and releases the native handle.
#[must_use]
pub fn start_transfer(stream: ResourceStream, secure: bool) -> (StaticBody, TransferHandle) {
    let (guard, handle) = ReleaseGuard::new();

    match stream {
        ResourceStream::File { file, len } => {
            let frame_bytes = if secure { CHUNK_BYTES } else { REGION_FRAME_BYTES };
            (
                StaticBody::File(FileBody::new(file, len, frame_bytes, guard)),
                handle,
            )
        }
        ResourceStream::ArchiveEntry {
            archive,
            entry_name,
            len,
        } => {
            let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(1);
            tokio::task::spawn_blocking(move || {
                pump_archive_entry(&archive, &entry_name, &tx, guard);
            });
            (StaticBody::Channel(ChannelBody::new(rx, len)), handle)
        }
    }
}

/// How the archive pump loop ended.
enum PumpEnd {
    Done,
    ReceiverGone,
    Io(io::Error),
}

/// Blocking pump: decompress one archive entry into the bounded channel.
///
/// Runs on the blocking pool. The archive handle lives inside this frame,
/// so every exit path releases it; the guard fires before the handle
/// closes.
fn pump_archive_entry(
    archive: &Path,
    entry_name: &str,
    tx: &mpsc::Sender<io::Result<Bytes>>,
    mut guard: ReleaseGuard,
) {
    match run_pump(archive, entry_name, tx, &mut guard) {
        PumpEnd::Done => guard.complete_ok(),
        PumpEnd::ReceiverGone => {
            trace!(archive = %archive.display(), entry_name, "peer stopped reading archive entry");
            // Guard drop reports the abort.
        }
        PumpEnd::Io(e) => {
            let _ = tx.blocking_send(Err(e));
            guard.complete_failed();
        }
    }
}

fn run_pump(
    archive: &Path,
    entry_name: &str,
    tx: &mpsc::Sender<io::Result<Bytes>>,
    guard: &mut ReleaseGuard,
) -> PumpEnd {
    let file = match std::fs::File::open(archive) {
        Ok(f) => f,
        Err(e) => return PumpEnd::Io(e),
    };
    let mut zip = match zip::ZipArchive::new(file) {
        Ok(z) => z,
        Err(e) => return PumpEnd::Io(io::Error::other(e)),
    };
    let mut entry = match zip.by_name(entry_name) {
        Ok(e) => e,
        Err(e) => return PumpEnd::Io(io::Error::new(io::ErrorKind::NotFound, e)),
    };

    let mut buf = vec![0u8; CHUNK_BYTES];
    loop {
        let n = match entry.read(&mut buf) {
            Ok(n) => n,
            Err(e) => return PumpEnd::Io(e),
        };
        if n == 0 {
            return PumpEnd::Done;
        }
        guard.add_bytes(n as u64);
        if tx
            .blocking_send(Ok(Bytes::copy_from_slice(&buf[..n])))
            .is_err()
        {
            return PumpEnd::ReceiverGone;
        }
    }
}
