//! HTTP host and graceful shutdown.
//!
//! The server is the transport the pipeline runs behind. For every request it:
//!
//! 1. Collects the body and records its exact length in `content-length`.
//! 2. Builds a [`Context`] whose `remote_addr` is the peer's IP.
//! 3. Runs the [`Pipeline`].
//! 4. Sends back whatever status, headers and body bytes the pipeline left
//!    in the context, or an empty `500` if the pipeline returned a fault.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()`, so no new connections are made.
//! 2. Letting every in-flight connection task run to completion.
//! 3. Returning from [`Server::serve`], which lets `main` exit cleanly.

use std::convert::Infallible;
use std::future::Future;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{StatusCode, header};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::context::Context;
use crate::error::Error;
use crate::middleware::Pipeline;
use crate::request::RequestContext;

enum Listen {
    Addr(SocketAddr),
    Listener(TcpListener),
}

/// The HTTP server.
pub struct Server {
    listen: Listen,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust,no_run
    /// use portico::Server;
    /// let server = Server::bind(([0, 0, 0, 0], 3000).into());
    /// ```
    pub fn bind(addr: SocketAddr) -> Self {
        Self { listen: Listen::Addr(addr) }
    }

    /// Serves on an already-bound listener (e.g. port `0` in tests).
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { listen: Listen::Listener(listener) }
    }

    /// Starts accepting connections and dispatching them through `pipeline`.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, pipeline: Pipeline) -> Result<(), Error> {
        self.serve_with_shutdown(pipeline, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops accepting when `signal`
    /// resolves instead of waiting for an OS signal.
    pub async fn serve_with_shutdown<F>(self, pipeline: Pipeline, signal: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        let listener = match self.listen {
            Listen::Addr(addr) => TcpListener::bind(addr).await?,
            Listen::Listener(l) => l,
        };
        let local = listener.local_addr()?;

        // Shared read-only by every connection task; holds no per-request
        // state.
        let pipeline = Arc::new(pipeline);

        info!(addr = %local, interceptors = ?pipeline.names(), "portico listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM immediately stops
                // accepting new connections, even if more are queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let pipeline = Arc::clone(&pipeline);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection, not once
                        // per connection.
                        let svc = service_fn(move |req| {
                            let pipeline = Arc::clone(&pipeline);
                            async move { dispatch(pipeline, req, remote_addr).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection to finish before we return.
        while tasks.join_next().await.is_some() {}

        info!("portico stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the pipeline and turns the context back into a
/// hyper response.
///
/// The error type is [`Infallible`]: a pipeline fault becomes an empty `500`
/// here, so hyper never sees an error.
async fn dispatch(
    pipeline: Arc<Pipeline>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(peer = %remote_addr, "request body error: {e}");
            return Ok(empty(StatusCode::BAD_REQUEST));
        }
    };

    let mut cx = Context::new(request_context(parts, body, remote_addr));

    match pipeline.handle(&mut cx).await {
        Ok(_) => {
            let response = cx.response;
            let mut res = http::Response::new(Full::new(Bytes::from(response.body.into_bytes())));
            *res.status_mut() = response.status;
            *res.headers_mut() = response.headers;
            Ok(res)
        }
        Err(e) => {
            error!(peer = %remote_addr, method = %cx.request.method, path = %cx.request.path, "pipeline fault: {e}");
            Ok(empty(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn request_context(parts: http::request::Parts, body: Bytes, remote_addr: SocketAddr) -> RequestContext {
    let mut headers = parts.headers;
    // The body is fully collected, so its length is known exactly whatever
    // framing the client used.
    headers.insert(header::CONTENT_LENGTH, body.len().into());

    let host = parts
        .uri
        .authority()
        .map(|a| a.as_str().to_owned())
        .or_else(|| headers.get(header::HOST).and_then(|h| h.to_str().ok()).map(str::to_owned))
        .unwrap_or_default();

    RequestContext {
        method: parts.method,
        scheme: parts.uri.scheme_str().unwrap_or("http").to_owned(),
        host,
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(|q| format!("?{q}")).unwrap_or_default(),
        // Dual-stack listeners report IPv4 peers as `::ffff:a.b.c.d`.
        remote_addr: Some(remote_addr.ip().to_canonical().to_string()),
        headers,
        body: Box::new(Cursor::new(body)),
    }
}

fn empty(status: StatusCode) -> http::Response<Full<Bytes>> {
    let mut res = http::Response::new(Full::new(Bytes::new()));
    *res.status_mut() = status;
    res
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by `kubectl` and the
/// Kubernetes control plane) and **SIGINT** (Ctrl-C, for local dev).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves, so on non-Unix platforms the SIGTERM arm is
    // effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
