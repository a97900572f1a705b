//! Incoming side of the per-request envelope.

use std::fmt;

use http::{HeaderMap, Method, header};
use tokio::io::AsyncRead;

/// A readable request body stream.
///
/// Owned by the transport. Interceptors may swap in a replacement reader, but
/// whatever they install must yield the original bytes from the start.
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// The request half of a [`Context`](crate::Context).
pub struct RequestContext {
    pub method: Method,
    pub scheme: String,
    pub host: String,
    pub path: String,
    /// Raw query string including the leading `?`, or empty.
    pub query: String,
    /// Caller address as reported by the transport. `None` when unknown.
    pub remote_addr: Option<String>,
    pub headers: HeaderMap,
    pub body: BodyReader,
}

impl RequestContext {
    /// A request with an empty body and no headers, addressed to `path` on
    /// `http://localhost`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            scheme: "http".to_owned(),
            host: "localhost".to_owned(),
            path: path.into(),
            query: String::new(),
            remote_addr: None,
            headers: HeaderMap::new(),
            body: Box::new(tokio::io::empty()),
        }
    }

    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Sets an in-memory body and a matching `content-length` header.
    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        self.headers.insert(header::CONTENT_LENGTH, bytes.len().into());
        self.body = Box::new(std::io::Cursor::new(bytes));
        self
    }

    /// The declared body length.
    ///
    /// `None` when the header is missing or is not a plain decimal integer.
    pub fn content_length(&self) -> Option<u64> {
        let raw = self.headers.get(header::CONTENT_LENGTH)?.to_str().ok()?.trim();
        // `u64::from_str` also takes a leading `+`; the header is digits only.
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse().ok()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("remote_addr", &self.remote_addr)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
