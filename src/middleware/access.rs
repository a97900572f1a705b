//! Caller-address filter for mutating requests.
//!
//! `GET` always passes. Any other method is allowed only when the caller's
//! address is an exact member of the configured [`AccessPolicy`]; everyone
//! else gets an empty `401 Unauthorized` and the chain stops there.
//!
//! No subnet or CIDR matching. No header-based trust (`X-Forwarded-For`).
//! The address the transport reports is the address that is checked.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::error;

use super::{Interceptor, Next, Outcome};
use crate::context::Context;
use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::RequestContext;

// ── AccessPolicy ──────────────────────────────────────────────────────────────

/// The set of caller addresses allowed to issue non-`GET` requests.
///
/// Built once at startup and shared read-only; there is no way to mutate it
/// afterwards, so concurrent requests read it without locking.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccessPolicy {
    allowed: HashSet<IpAddr>,
}

impl AccessPolicy {
    pub fn new(allowed: impl IntoIterator<Item = IpAddr>) -> Self {
        Self { allowed: allowed.into_iter().collect() }
    }

    /// `127.0.0.1` and `::1`.
    pub fn loopback() -> Self {
        Self::new([IpAddr::from([127, 0, 0, 1]), IpAddr::from([0u16, 0, 0, 0, 0, 0, 0, 1])])
    }

    /// Parses each entry as an IP literal.
    ///
    /// Fails on the first entry that is not one, naming it.
    pub fn parse<I, S>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        entries
            .into_iter()
            .map(|s| {
                let s = s.as_ref().trim();
                s.parse::<IpAddr>()
                    .map_err(|_| Error::Config(format!("`{s}` is not an IP address")))
            })
            .collect::<Result<HashSet<_>, _>>()
            .map(|allowed| Self { allowed })
    }

    pub fn allows(&self, addr: &IpAddr) -> bool {
        self.allowed.contains(addr)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

// ── AccessFilter ──────────────────────────────────────────────────────────────

/// What the filter decided for one request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    Allow,
    Reject,
}

/// Rejects non-`GET` requests whose caller is not in the [`AccessPolicy`].
///
/// Every non-`GET` request leaves an error-level audit record with the
/// caller's address, whether or not it is then let through. A missing or
/// unparseable address is denied.
#[derive(Clone, Debug)]
pub struct AccessFilter {
    policy: Arc<AccessPolicy>,
}

impl AccessFilter {
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }

    /// Decides `req` without touching it.
    pub fn evaluate(&self, req: &RequestContext) -> Decision {
        if req.method == Method::GET {
            return Decision::Allow;
        }

        let remote = req.remote_addr.as_deref().unwrap_or("<unknown>");
        error!(remote_addr = %remote, method = %req.method, "request from remote address");

        let parsed = req.remote_addr.as_deref().and_then(|a| a.trim().parse::<IpAddr>().ok());
        match parsed {
            Some(addr) if self.policy.allows(&addr) => Decision::Allow,
            _ => {
                error!(remote_addr = %remote, method = %req.method, "forbidden request from remote address");
                Decision::Reject
            }
        }
    }
}

impl Interceptor for AccessFilter {
    fn intercept<'a>(
        &'a self,
        cx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, Result<Outcome, Error>> {
        Box::pin(async move {
            match self.evaluate(&cx.request) {
                Decision::Allow => next.run(cx).await,
                Decision::Reject => {
                    cx.response.status = StatusCode::UNAUTHORIZED;
                    Ok(Outcome::ShortCircuited)
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "access_filter"
    }
}
