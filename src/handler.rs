//! Terminal handler trait and type erasure.
//!
//! # How handlers borrow the context
//!
//! Every stage of the pipeline borrows the same `&mut Context`: an
//! interceptor lends it to the rest of the chain and gets it back when the
//! continuation returns, exactly like a nested function call. A future that
//! holds that borrow cannot be `'static`, so handler futures carry the
//! borrow's lifetime:
//!
//! ```text
//! fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>>
//! ```
//!
//! `Pin<Box<…>>` erases the concrete future type so handlers of different
//! types can sit behind one `Arc<dyn Handler>` in the composed pipeline.
//! The per-request cost is one allocation and one virtual call.
//!
//! Plain closures become handlers through [`handler_fn`]. Passing the closure
//! straight to `handler_fn` lets the compiler infer the higher-ranked
//! signature (`for<'a> Fn(&'a mut Context) -> BoxFuture<'a, _>`), which it
//! cannot do for a closure stored in a `let` first.

use std::future::Future;
use std::pin::Pin;

use crate::context::Context;
use crate::error::Error;

/// A heap-allocated, type-erased future borrowing for `'a`.
///
/// `Send` lets tokio move the request task between worker threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The innermost stage of a pipeline: the application itself.
///
/// A handler sets `cx.response.status` and writes its body into
/// `cx.response.body`. Returning `Err` is a fault; it propagates out of the
/// pipeline unrecovered.
///
/// ```rust
/// use portico::{BoxFuture, Context, Error, Handler};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>> {
///         Box::pin(async move {
///             cx.response.write("hello").await?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>>;
}

/// Adapts a closure into a [`Handler`].
///
/// ```rust
/// use http::StatusCode;
/// use portico::handler_fn;
///
/// let created = handler_fn(|cx| Box::pin(async move {
///     cx.response.status = StatusCode::CREATED;
///     cx.response.write(br#"{"id":7}"#).await?;
///     Ok(())
/// }));
/// # let _ = created;
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), Error>> + Send + Sync + 'static,
{
    FnHandler(f)
}

/// Newtype returned by [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, Result<(), Error>> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, cx: &'a mut Context) -> BoxFuture<'a, Result<(), Error>> {
        (self.0)(cx)
    }
}
