//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use http::StatusCode;
use portico::{Handler, handler_fn};
use tokio::io::AsyncReadExt;

// The unit tests' log capture, compiled into this test crate as well.
#[path = "../../src/testing.rs"]
mod log_capture;

#[allow(unused_imports)]
pub(crate) use log_capture::LogCapture;

/// A handler that drains the request body, counts its invocations, and
/// answers `status` with `reply`.
pub fn counting_handler(status: StatusCode, reply: &'static str, calls: Arc<AtomicUsize>) -> impl Handler {
    handler_fn(move |cx| {
        let calls = Arc::clone(&calls);
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let mut body = Vec::new();
            cx.request.body.read_to_end(&mut body).await?;
            cx.response.status = status;
            cx.response.write(reply).await?;
            Ok(())
        })
    })
}
