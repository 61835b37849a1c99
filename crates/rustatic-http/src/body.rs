//! Response body types for the static file service.
//!
//! [`StaticBody`] is the HTTP response body used throughout the service.
//! It supports four modes:
//!
//! - **Empty**: 304, HEAD, and short error responses.
//! - **Buffered**: small plain-text payloads (400/500 bodies).
//! - **File**: frames read straight from an open file descriptor. The
//!   frame size is chosen by the transfer layer: whole-file region frames
//!   on plaintext channels, a fixed small buffer when an encryption layer
//!   must see every byte.
//! - **Channel**: frames pumped from a blocking task, used for archive
//!   entries that have no descriptor to read asynchronously.
//!
//! The File and Channel modes own the transfer's release bookkeeping: the
//! completion guard fires when the body ends, errors, or is dropped
//! mid-transfer, and the native handle goes with it.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::Frame;
use http_body_util::Full;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;

use crate::transfer::ReleaseGuard;

/// Response body supporting empty, buffered, and streaming modes.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper
/// responses.
#[derive(Debug, Default)]
pub enum StaticBody {
    /// No body: 304, HEAD, and short error responses.
    #[default]
    Empty,
    /// Buffered body for small payloads.
    Buffered(Full<Bytes>),
    /// Frames read from an open file descriptor.
    File(FileBody),
    /// Frames received from a blocking pump task.
    Channel(ChannelBody),
}

impl StaticBody {
    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }
}

impl http_body::Body for StaticBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Empty => Poll::Ready(None),
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::File(file) => file.poll_frame(cx),
            Self::Channel(channel) => channel.poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Buffered(full) => full.is_end_stream(),
            Self::File(file) => file.remaining == 0,
            Self::Channel(channel) => channel.done,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Empty => http_body::SizeHint::with_exact(0),
            Self::Buffered(full) => full.size_hint(),
            Self::File(file) => http_body::SizeHint::with_exact(file.remaining),
            Self::Channel(channel) => http_body::SizeHint::with_exact(channel.remaining),
        }
    }
}

// ---------------------------------------------------------------------------
// FileBody
// ---------------------------------------------------------------------------

/// A body that reads frames directly from an open file.
///
/// Reads exactly the length the response headers were sized to; a file
/// that shrinks mid-transfer surfaces as an unexpected-EOF error. On
/// every exit path the descriptor is dropped first, then the release
/// guard fires, so the handle never resolves before the resource is
/// gone. Descriptor close errors cannot surface.
#[derive(Debug)]
pub struct FileBody {
    file: Option<tokio::fs::File>,
    remaining: u64,
    frame_bytes: usize,
    guard: ReleaseGuard,
}

impl FileBody {
    pub(crate) fn new(
        file: tokio::fs::File,
        len: u64,
        frame_bytes: usize,
        guard: ReleaseGuard,
    ) -> Self {
        Self {
            file: Some(file),
            remaining: len,
            frame_bytes,
            guard,
        }
    }

    fn poll_frame(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
        if self.remaining == 0 {
            self.file = None;
            self.guard.complete_ok();
            return Poll::Ready(None);
        }

        let want = usize::try_from(self.remaining)
            .unwrap_or(self.frame_bytes)
            .min(self.frame_bytes);
        let mut buf = BytesMut::zeroed(want);
        let mut read_buf = ReadBuf::new(&mut buf);

        let poll = match self.file.as_mut() {
            None => return Poll::Ready(None),
            Some(file) => Pin::new(file).poll_read(cx, &mut read_buf),
        };

        match poll {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => {
                self.file = None;
                self.guard.complete_failed();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(Ok(())) => {
                let n = read_buf.filled().len();
                if n == 0 {
                    self.file = None;
                    self.guard.complete_failed();
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file shrank during transfer",
                    ))));
                }
                self.remaining -= n as u64;
                self.guard.add_bytes(n as u64);
                buf.truncate(n);
                Poll::Ready(Some(Ok(Frame::data(buf.freeze()))))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelBody
// ---------------------------------------------------------------------------

/// A body fed by a blocking pump through a bounded channel.
///
/// The pump owns the native handle and the release guard; this side only
/// forwards frames. A channel that closes before the promised length has
/// arrived means the pump died, which surfaces as an unexpected EOF.
#[derive(Debug)]
pub struct ChannelBody {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    remaining: u64,
    done: bool,
}

impl ChannelBody {
    pub(crate) fn new(rx: mpsc::Receiver<io::Result<Bytes>>, len: u64) -> Self {
        Self {
            rx,
            remaining: len,
            done: false,
        }
    }

    fn poll_frame(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, io::Error>>> {
        if self.done {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(data))) => {
                self.remaining = self.remaining.saturating_sub(data.len() as u64);
                Poll::Ready(Some(Ok(Frame::data(data))))
            }
            Poll::Ready(Some(Err(e))) => {
                self.done = true;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.done = true;
                if self.remaining > 0 {
                    return Poll::Ready(Some(Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "archive pump ended before the promised length",
                    ))));
                }
                Poll::Ready(None)
            }
        }
    }
}
