//! # portico
//!
//! A minimal HTTP interceptor pipeline. Two gates stand in front of your
//! handler, and nothing else.
//!
//! ## The contract
//!
//! ```text
//! client ─▶ AccessFilter ─▶ CaptureLogger ─▶ your handler
//!                │                 │
//!                └─ non-GET from an unknown address: empty 401, stop here
//!                                  └─ logs full request + response, changes neither
//! ```
//!
//! - **[`AccessFilter`]**: `GET` always passes. Every other method needs a
//!   caller address that is an exact member of the [`AccessPolicy`]. Unknown,
//!   missing or malformed addresses are rejected.
//! - **[`CaptureLogger`]**: reads the request body and the response body in
//!   full for the log, and hands both on byte-for-byte unchanged.
//! - **[`Pipeline`]**: composes interceptors around a [`Handler`] in the
//!   order you list them. [`Pipeline::standard`] is the order above.
//!
//! What portico intentionally leaves to others: routing, authentication,
//! audit storage (logs go to whatever `tracing` subscriber you install), and
//! transport tuning.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use portico::{handler_fn, Config, Pipeline, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portico::Error> {
//!     tracing_subscriber::fmt::init();
//!
//!     let config = Config::from_env()?;
//!     let app = handler_fn(|cx| Box::pin(async move {
//!         cx.response.status = StatusCode::CREATED;
//!         cx.response.write(br#"{"id":7}"#).await?;
//!         Ok(())
//!     }));
//!
//!     Server::bind(config.bind)
//!         .serve(Pipeline::standard(config.policy(), app))
//!         .await
//! }
//! ```

mod config;
mod context;
mod error;
mod handler;
mod request;
mod response;
mod server;

#[cfg(test)]
mod testing;

pub mod middleware;

pub use config::Config;
pub use context::Context;
pub use error::Error;
pub use handler::{BoxFuture, FnHandler, Handler, handler_fn};
pub use middleware::{AccessFilter, AccessPolicy, CaptureLogger, Decision, Interceptor, Next, Outcome, Pipeline};
pub use request::{BodyReader, RequestContext};
pub use response::{ResponseBody, ResponseContext};
pub use server::Server;
