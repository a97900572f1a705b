//! Full-content request/response logging.
//!
//! # Reading a body without consuming it
//!
//! The request body is a one-shot stream: whoever reads it first takes the
//! bytes. The logger reads the declared `content-length` into an owned
//! buffer, then installs a new reader in front of the transport's stream:
//!
//! ```text
//! Cursor(buffer)  ──chain──▶  original stream (whatever is left)
//! ```
//!
//! The handler reads the same bytes, from the start, in the same order.
//!
//! The response sink may be a socket that cannot be read back. For the
//! duration of the continuation the logger swaps in an in-memory buffer,
//! then swaps the original sink back, logs the buffer, and delivers it to
//! the original sink exactly once:
//!
//! ```text
//! original = replace(body, Buffer)   →   next.run(cx)
//! captured = replace(body, original) →   log(captured)   →   body.deliver(captured)
//! ```
//!
//! If the continuation fails, the original sink is already back in place
//! when the fault propagates, the buffer is dropped, and nothing is
//! delivered. The swap is held by [`SinkSwap`], so the same holds when the
//! pipeline future is dropped before the continuation finishes.

use std::io::Cursor;

use http::StatusCode;
use tokio::io::AsyncReadExt;
use tracing::info;

use super::{Interceptor, Next, Outcome};
use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::RequestContext;
use crate::response::ResponseBody;

/// Upper bound on the up-front allocation for a request body. Larger bodies
/// still capture in full; the buffer just grows as bytes arrive instead of
/// trusting a client-declared length.
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Logs every request and response in full, without altering either.
///
/// Emits, at info level and in this order: an arrival banner, the formatted
/// request, the formatted response, and a completion trailer. Place it
/// directly around the handler so the response record reflects the final
/// status.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureLogger;

impl CaptureLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for CaptureLogger {
    fn intercept<'a>(
        &'a self,
        cx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Outcome, Error>> {
        Box::pin(async move {
            let remote = cx.request.remote_addr.as_deref().unwrap_or("<unknown>");
            info!(remote_addr = %remote, "received request from the client");

            let body = capture_request(&mut cx.request).await?;
            info!("{}", format_request(&cx.request, &body));

            let (result, captured) = {
                let mut swap = SinkSwap::install(cx);
                let result = next.run(&mut *swap.cx).await;
                (result, swap.restore())
            };
            let outcome = result?;

            // Status is read only now: the handler may set it at any point
            // up to its return.
            info!("{}", format_response(cx.response.status, &String::from_utf8_lossy(&captured)));
            cx.response.body.deliver(&captured).await?;

            info!("request processed");
            Ok(outcome)
        })
    }

    fn name(&self) -> &'static str {
        "capture_logger"
    }
}

/// Holds the client-facing sink while the continuation writes into a
/// buffer. Dropping it puts the sink back and frees the buffer.
struct SinkSwap<'c> {
    cx: &'c mut Context,
    original: Option<ResponseBody>,
}

impl<'c> SinkSwap<'c> {
    fn install(cx: &'c mut Context) -> Self {
        let original = cx.response.replace_body(ResponseBody::buffer());
        Self { cx, original: Some(original) }
    }

    /// Puts the original sink back and returns what the continuation wrote.
    fn restore(&mut self) -> Vec<u8> {
        match self.original.take() {
            Some(original) => self.cx.response.replace_body(original).into_bytes(),
            None => Vec::new(),
        }
    }
}

impl Drop for SinkSwap<'_> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            self.cx.response.replace_body(original);
        }
    }
}

/// Reads the declared body into memory and puts a replaying reader in place.
///
/// Returns the body decoded as UTF-8 (lossy). An absent, zero or malformed
/// `content-length` yields an empty string and leaves the stream untouched.
async fn capture_request(req: &mut RequestContext) -> Result<String, Error> {
    let Some(len) = req.content_length().filter(|&n| n > 0) else {
        return Ok(String::new());
    };

    let prealloc = usize::try_from(len).unwrap_or(usize::MAX).min(PREALLOC_LIMIT);
    let mut buf = Vec::with_capacity(prealloc);

    let stream = std::mem::replace(&mut req.body, Box::new(tokio::io::empty()));
    let mut limited = stream.take(len);
    let read = limited.read_to_end(&mut buf).await;
    let rest = limited.into_inner();

    let text = String::from_utf8_lossy(&buf).into_owned();
    // Reinstall before surfacing any read error so the bytes already taken
    // are not lost to later readers.
    req.body = Box::new(Cursor::new(buf).chain(rest));
    read?;

    Ok(text)
}

fn format_request(req: &RequestContext, body: &str) -> String {
    let mut line = format!(
        " REQUEST  - [{}] {}://{}{} {}",
        req.method, req.scheme, req.host, req.path, req.query,
    );
    if !body.is_empty() {
        line.push_str("\n Request data: ");
        line.push_str(body);
    }
    line
}

fn format_response(status: StatusCode, body: &str) -> String {
    format!(" RESPONSE - Status code: {} : Response data: {body}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context as TaskContext, Poll};
    use std::time::Duration;

    use http::{HeaderValue, Method, header};
    use tokio::io::{AsyncRead, ReadBuf};

    use super::*;
    use crate::handler::handler_fn;
    use crate::middleware::Pipeline;
    use crate::response::ResponseContext;
    use crate::testing::LogCapture;

    /// Echoes the request body back with `status`.
    fn echo(status: StatusCode) -> Pipeline {
        Pipeline::builder().interceptor(CaptureLogger::new()).handler(handler_fn(move |cx| {
            Box::pin(async move {
                let mut seen = Vec::new();
                cx.request.body.read_to_end(&mut seen).await?;
                cx.response.status = status;
                cx.response.write(&seen).await?;
                Ok(())
            })
        }))
    }

    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away")))
        }
    }

    #[tokio::test]
    async fn handler_sees_the_whole_request_body_from_the_start() {
        let large: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        for body in [Vec::new(), b"x".to_vec(), br#"{"x":1}"#.to_vec(), large] {
            let req = RequestContext::new(Method::POST, "/echo").body(body.clone());
            let mut cx = Context::new(req);

            echo(StatusCode::OK).handle(&mut cx).await.unwrap();

            assert_eq!(cx.response.body.into_bytes(), body);
        }
    }

    #[tokio::test]
    async fn capture_returns_decoded_text_and_replays_it() {
        let mut req = RequestContext::new(Method::PUT, "/").body("héllo");
        let text = capture_request(&mut req).await.unwrap();
        assert_eq!(text, "héllo");

        let mut again = String::new();
        req.body.read_to_string(&mut again).await.unwrap();
        assert_eq!(again, "héllo");
    }

    #[tokio::test]
    async fn bytes_past_the_declared_length_are_kept() {
        let mut req = RequestContext::new(Method::POST, "/");
        req.headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("3"));
        req.body = Box::new(Cursor::new(b"abcdef".to_vec()));

        assert_eq!(capture_request(&mut req).await.unwrap(), "abc");

        let mut all = Vec::new();
        req.body.read_to_end(&mut all).await.unwrap();
        assert_eq!(all, b"abcdef");
    }

    #[tokio::test]
    async fn missing_or_malformed_length_captures_nothing_and_leaves_stream_alone() {
        for declared in [None, Some("0"), Some("lots"), Some("")] {
            let mut req = RequestContext::new(Method::POST, "/");
            req.body = Box::new(Cursor::new(b"streamed".to_vec()));
            if let Some(v) = declared {
                req.headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static(v));
            }

            assert_eq!(capture_request(&mut req).await.unwrap(), "");

            let mut rest = Vec::new();
            req.body.read_to_end(&mut rest).await.unwrap();
            assert_eq!(rest, b"streamed");
        }
    }

    #[tokio::test]
    async fn request_read_failure_is_a_fault_and_skips_handler() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        let pipeline = Pipeline::builder().interceptor(CaptureLogger::new()).handler(handler_fn(
            move |_cx| {
                let flag = Arc::clone(&flag);
                Box::pin(async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                })
            },
        ));

        let mut req = RequestContext::new(Method::POST, "/");
        req.headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("10"));
        req.body = Box::new(Broken);
        let mut cx = Context::new(req);

        let err = pipeline.handle(&mut cx).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn response_reaches_a_one_way_sink_exactly_once() {
        let (tx, mut rx) = tokio::io::duplex(1024);
        let req = RequestContext::new(Method::POST, "/").body(b"ping-pong".to_vec());
        let mut cx = Context::with_response(req, ResponseContext::with_body(ResponseBody::stream(tx)));

        echo(StatusCode::ACCEPTED).handle(&mut cx).await.unwrap();
        drop(cx);

        let mut wire = Vec::new();
        rx.read_to_end(&mut wire).await.unwrap();
        assert_eq!(wire, b"ping-pong");
    }

    #[tokio::test]
    async fn response_appends_to_what_the_sink_already_held() {
        let req = RequestContext::new(Method::GET, "/");
        let sink = ResponseBody::Buffer(b"preamble|".to_vec());
        let mut cx = Context::with_response(req, ResponseContext::with_body(sink));

        let pipeline = Pipeline::builder()
            .interceptor(CaptureLogger::new())
            .handler(handler_fn(|cx| Box::pin(async move {
                cx.response.write("part one, ").await?;
                cx.response.write("part two").await?;
                Ok(())
            })));
        pipeline.handle(&mut cx).await.unwrap();

        assert_eq!(cx.response.body.into_bytes(), b"preamble|part one, part two");
    }

    #[tokio::test]
    async fn handler_fault_restores_original_sink_and_delivers_nothing() {
        let req = RequestContext::new(Method::GET, "/");
        let sink = ResponseBody::Buffer(b"untouched".to_vec());
        let mut cx = Context::with_response(req, ResponseContext::with_body(sink));

        let pipeline = Pipeline::builder()
            .interceptor(CaptureLogger::new())
            .handler(handler_fn(|cx| Box::pin(async move {
                cx.response.write("half a resp").await?;
                Err(Error::handler("crashed mid-write"))
            })));

        let err = pipeline.handle(&mut cx).await.unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(cx.response.body.into_bytes(), b"untouched");
    }

    #[tokio::test]
    async fn cancelled_continuation_puts_the_original_sink_back() {
        let (tx, mut rx) = tokio::io::duplex(256);
        let req = RequestContext::new(Method::GET, "/");
        let mut cx = Context::with_response(req, ResponseContext::with_body(ResponseBody::stream(tx)));

        let pipeline = Pipeline::builder()
            .interceptor(CaptureLogger::new())
            .handler(handler_fn(|cx| Box::pin(async move {
                cx.response.write("partial").await?;
                std::future::pending::<()>().await;
                Ok(())
            })));

        let elapsed = tokio::time::timeout(Duration::from_millis(20), pipeline.handle(&mut cx)).await;
        assert!(elapsed.is_err());
        assert!(matches!(cx.response.body, ResponseBody::Stream(_)));

        // The sink still reaches the client; the handler's partial bytes never did.
        cx.response.write("late").await.unwrap();
        drop(cx);

        let mut wire = Vec::new();
        rx.read_to_end(&mut wire).await.unwrap();
        assert_eq!(wire, b"late");
    }

    #[tokio::test]
    async fn logs_request_before_response_with_final_status() {
        let logs = LogCapture::new();
        let _guard = logs.install();

        let mut req = RequestContext::new(Method::POST, "/widgets")
            .remote_addr("127.0.0.1")
            .query("?color=red")
            .body(br#"{"x":1}"#.to_vec());
        req.host = "api.example.test".to_owned();
        let mut cx = Context::new(req);

        echo(StatusCode::CREATED).handle(&mut cx).await.unwrap();

        let out = logs.contents();
        let request_at = out
            .find(" REQUEST  - [POST] http://api.example.test/widgets ?color=red")
            .expect("request record");
        let data_at = out.find(r#"Request data: {"x":1}"#).expect("request body");
        let response_at = out
            .find(r#" RESPONSE - Status code: 201 : Response data: {"x":1}"#)
            .expect("response record");
        let done_at = out.find("request processed").expect("trailer");

        assert!(request_at < data_at);
        assert!(data_at < response_at);
        assert!(response_at < done_at);
    }

    #[test]
    fn request_record_omits_empty_body() {
        let req = RequestContext::new(Method::GET, "/health");
        assert_eq!(format_request(&req, ""), " REQUEST  - [GET] http://localhost/health ");
    }
}
