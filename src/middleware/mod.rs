//! Interceptor chain.
//!
//! An [`Interceptor`] sees the [`Context`] on the way in, decides whether to
//! hand it to the rest of the chain ([`Next`]), and sees it again on the way
//! out. A [`Pipeline`] is the composition of an ordered interceptor list
//! around a terminal [`Handler`].
//!
//! Composition is a right fold performed once, when the pipeline is built:
//!
//! ```text
//! [A, B, C] + handler   →   A( B( C( handler ) ) )
//! ```
//!
//! so `pipeline.handle(cx)` enters `A` first and the handler last. Nothing is
//! discovered or reordered at runtime: the order you list is the order that
//! runs.
//!
//! Built-in interceptors:
//! - [`AccessFilter`]: rejects non-`GET` requests from unknown addresses
//! - [`CaptureLogger`]: logs full request and response bodies, transparently

mod access;
mod capture;

pub use access::{AccessFilter, AccessPolicy, Decision};
pub use capture::CaptureLogger;

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxFuture, Handler};

// ── Outcome ───────────────────────────────────────────────────────────────────

/// How a traversal of the chain ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Every stage ran; the terminal handler returned normally.
    Continued,
    /// Some interceptor answered the request itself. Nothing after it ran.
    ShortCircuited,
}

// ── Interceptor ───────────────────────────────────────────────────────────────

/// A stage in the pipeline.
///
/// Call `next.run(cx)` to resume the rest of the chain; return without
/// calling it to short-circuit. `Next` is consumed by `run`, so the rest of
/// the chain runs at most once per invocation.
///
/// ```rust
/// use portico::middleware::{Interceptor, Next, Outcome};
/// use portico::{BoxFuture, Context, Error};
///
/// struct RequireJson;
///
/// impl Interceptor for RequireJson {
///     fn intercept<'a>(
///         &'a self,
///         cx: &'a mut Context,
///         next: Next<'a>,
///     ) -> BoxFuture<'a, Result<Outcome, Error>> {
///         Box::pin(async move {
///             if cx.request.headers.get("content-type").is_none() {
///                 cx.response.status = http::StatusCode::UNSUPPORTED_MEDIA_TYPE;
///                 return Ok(Outcome::ShortCircuited);
///             }
///             next.run(cx).await
///         })
///     }
/// }
/// ```
pub trait Interceptor: Send + Sync + 'static {
    fn intercept<'a>(
        &'a self,
        cx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Outcome, Error>>;

    /// Label used by [`Pipeline::names`].
    fn name(&self) -> &'static str {
        "interceptor"
    }
}

// ── Chain links ───────────────────────────────────────────────────────────────

/// A composed stage: either one interceptor wrapping an inner link, or the
/// terminal handler.
trait Link: Send + Sync {
    fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<Outcome, Error>>;
}

struct Terminal(Arc<dyn Handler>);

impl Link for Terminal {
    fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<Outcome, Error>> {
        let fut = self.0.call(cx);
        Box::pin(async move {
            fut.await?;
            Ok(Outcome::Continued)
        })
    }
}

struct Layer {
    interceptor: Arc<dyn Interceptor>,
    inner: Box<dyn Link>,
}

impl Link for Layer {
    fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<Outcome, Error>> {
        self.interceptor.intercept(cx, Next { inner: self.inner.as_ref() })
    }
}

/// The rest of the chain, as seen from inside an interceptor.
pub struct Next<'a> {
    inner: &'a dyn Link,
}

impl<'a> Next<'a> {
    /// Resumes the chain with `cx`. The returned future completes once every
    /// downstream stage, including the terminal handler, has returned.
    pub fn run<'b>(self, cx: &'b mut Context) -> BoxFuture<'b, Result<Outcome, Error>>
    where
        'a: 'b,
    {
        self.inner.call(cx)
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Next")
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// An interceptor list composed around a terminal handler.
///
/// Build once at startup and share behind an `Arc`; [`Pipeline::handle`]
/// takes `&self` and holds no per-request state.
///
/// ```rust
/// use std::sync::Arc;
/// use portico::{handler_fn, AccessPolicy, Pipeline};
///
/// let policy = Arc::new(AccessPolicy::loopback());
/// let pipeline = Pipeline::standard(policy, handler_fn(|cx| Box::pin(async move {
///     cx.response.write("ok").await?;
///     Ok(())
/// })));
///
/// assert_eq!(pipeline.names(), ["access_filter", "capture_logger"]);
/// ```
pub struct Pipeline {
    entry: Box<dyn Link>,
    names: Vec<&'static str>,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder { interceptors: Vec::new() }
    }

    /// The production ordering: [`AccessFilter`] → [`CaptureLogger`] →
    /// `handler`.
    ///
    /// The filter sits outermost so a rejected request pays no buffering
    /// cost; the logger sits directly around the handler so it sees the
    /// final status and body.
    pub fn standard(policy: Arc<AccessPolicy>, handler: impl Handler) -> Self {
        Self::builder()
            .interceptor(AccessFilter::new(policy))
            .interceptor(CaptureLogger::new())
            .handler(handler)
    }

    /// Runs `cx` through the chain.
    ///
    /// Faults from any stage propagate unchanged; no recovery happens here.
    pub async fn handle(&self, cx: &mut Context) -> Result<Outcome, Error> {
        self.entry.call(cx).await
    }

    /// Interceptor names, outermost first.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").field("interceptors", &self.names).finish_non_exhaustive()
    }
}

/// Collects interceptors in execution order. Obtain via [`Pipeline::builder`].
pub struct PipelineBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl PipelineBuilder {
    /// Appends `interceptor`; it runs after every interceptor added before it.
    pub fn interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends an interceptor that is already shared elsewhere.
    pub fn shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Terminates the chain with `handler` and composes it.
    pub fn handler(self, handler: impl Handler) -> Pipeline {
        let names = self.interceptors.iter().map(|i| i.name()).collect();

        // Right fold: the last interceptor wraps the handler, the first
        // interceptor ends up outermost.
        let terminal: Box<dyn Link> = Box::new(Terminal(Arc::new(handler)));
        let entry = self.interceptors.into_iter().rev().fold(terminal, |inner, interceptor| {
            Box::new(Layer { interceptor, inner }) as Box<dyn Link>
        });

        Pipeline { entry, names }
    }
}
