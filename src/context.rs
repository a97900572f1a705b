//! The per-request envelope passed through the interceptor chain.

use crate::request::RequestContext;
use crate::response::ResponseContext;

/// One request's mutable state.
///
/// Created by the transport for each incoming request, lent mutably to every
/// interceptor in turn and then to the terminal handler, and dropped when the
/// request completes. Never shared between requests.
#[derive(Debug)]
pub struct Context {
    pub request: RequestContext,
    pub response: ResponseContext,
}

impl Context {
    /// Pairs `request` with a fresh `200 OK` response writing to memory.
    pub fn new(request: RequestContext) -> Self {
        Self { request, response: ResponseContext::new() }
    }

    pub fn with_response(request: RequestContext, response: ResponseContext) -> Self {
        Self { request, response }
    }
}
