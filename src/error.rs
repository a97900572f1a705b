//! Unified error type.

use std::fmt;

/// The error type returned by portico's fallible operations.
///
/// An access denial is *not* an `Error`: the filter answers it with a `401`
/// and a short-circuit [`Outcome`](crate::middleware::Outcome). This type
/// surfaces faults: stream I/O failures, application handler failures, and
/// bad startup configuration. Faults propagate out of the pipeline untouched;
/// the host decides what the client sees.
#[derive(Debug)]
pub enum Error {
    /// Reading the request stream, writing the response sink, or socket I/O.
    Io(std::io::Error),
    /// The terminal handler (or a custom interceptor) gave up.
    Handler(Box<dyn std::error::Error + Send + Sync>),
    /// Startup configuration could not be parsed.
    Config(String),
}

impl Error {
    /// Wraps any application error as a handler fault.
    pub fn handler(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(e.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)      => write!(f, "io: {e}"),
            Self::Handler(e) => write!(f, "handler: {e}"),
            Self::Config(m)  => write!(f, "config: {m}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e)      => Some(e),
            Self::Handler(e) => Some(e.as_ref()),
            Self::Config(_)  => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
