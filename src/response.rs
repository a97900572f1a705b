//! Outgoing side of the per-request envelope.
//!
//! Handlers set [`ResponseContext::status`] and write bytes into
//! [`ResponseContext::body`]. Whatever sink the host installed receives those
//! bytes, even when interceptors buffer them on the way out.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use http::{HeaderMap, StatusCode};
use tokio::io::{AsyncWrite, AsyncWriteExt};

// ── ResponseBody ──────────────────────────────────────────────────────────────

/// The write target for a response body.
///
/// `Buffer` is an in-memory sink that can be taken back out with
/// [`ResponseBody::into_bytes`]; `Stream` forwards to any one-way writer
/// (a socket, a pipe) that cannot be rewound or read back.
pub enum ResponseBody {
    Buffer(Vec<u8>),
    Stream(Box<dyn AsyncWrite + Send + Unpin>),
}

impl ResponseBody {
    pub fn buffer() -> Self {
        Self::Buffer(Vec::new())
    }

    pub fn stream(writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self::Stream(Box::new(writer))
    }

    /// Bytes written so far, if this is an in-memory sink.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Buffer(buf) => Some(buf.as_slice()),
            Self::Stream(_)   => None,
        }
    }

    /// Consumes the sink, returning its bytes. A `Stream` sink has already
    /// handed its bytes on, so this yields an empty vector for it.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Buffer(buf) => buf,
            Self::Stream(_)   => Vec::new(),
        }
    }

    /// Writes `bytes` in full and flushes.
    pub async fn deliver(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes).await?;
        self.flush().await
    }
}

impl Default for ResponseBody {
    fn default() -> Self { Self::buffer() }
}

impl AsyncWrite for ResponseBody {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Buffer(v) => Pin::new(v).poll_write(cx, buf),
            Self::Stream(w) => Pin::new(w).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Buffer(v) => Pin::new(v).poll_flush(cx),
            Self::Stream(w) => Pin::new(w).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Buffer(v) => Pin::new(v).poll_shutdown(cx),
            Self::Stream(w) => Pin::new(w).poll_shutdown(cx),
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(buf) => f.debug_tuple("Buffer").field(&buf.len()).finish(),
            Self::Stream(_)   => f.write_str("Stream(..)"),
        }
    }
}

// ── ResponseContext ───────────────────────────────────────────────────────────

/// The response half of a [`Context`](crate::Context).
///
/// Starts as `200 OK` with no headers and an in-memory body.
#[derive(Debug, Default)]
pub struct ResponseContext {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A response that writes into `body` instead of the default buffer.
    pub fn with_body(body: ResponseBody) -> Self {
        Self { body, ..Self::default() }
    }

    /// Puts `body` in place as the write target and returns the previous one.
    pub fn replace_body(&mut self, body: ResponseBody) -> ResponseBody {
        std::mem::replace(&mut self.body, body)
    }

    /// Shorthand for handlers: writes `bytes` to the body.
    pub async fn write(&mut self, bytes: impl AsRef<[u8]>) -> io::Result<()> {
        self.body.write_all(bytes.as_ref()).await
    }
}
