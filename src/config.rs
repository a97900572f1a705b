//! Startup configuration.
//!
//! Read once, before the server starts. There is no reload path: changing
//! the allow-list means restarting the process.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `PORTICO_BIND` | `0.0.0.0:3000` | `host:port` to listen on |
//! | `PORTICO_ALLOWED_ADDRESSES` | `127.0.0.1,::1` | comma-separated IP literals allowed to send non-`GET` requests |
//!
//! Set `PORTICO_ALLOWED_ADDRESSES` to an empty string to reject every
//! mutating request.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::Error;
use crate::middleware::AccessPolicy;

const BIND_VAR: &str = "PORTICO_BIND";
const ALLOWED_VAR: &str = "PORTICO_ALLOWED_ADDRESSES";

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_ALLOWED: &str = "127.0.0.1,::1";

#[derive(Clone, Debug)]
pub struct Config {
    pub bind: SocketAddr,
    policy: Arc<AccessPolicy>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_vars(&env::vars().collect())
    }

    /// Loads configuration from a map (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, Error> {
        let bind_raw = vars.get(BIND_VAR).map(String::as_str).unwrap_or(DEFAULT_BIND);
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| Error::Config(format!("{BIND_VAR}: `{bind_raw}` is not a host:port address")))?;

        let allowed_raw = vars.get(ALLOWED_VAR).map(String::as_str).unwrap_or(DEFAULT_ALLOWED);
        let policy = AccessPolicy::parse(allowed_raw.split(',').map(str::trim).filter(|s| !s.is_empty()))
            .map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("{ALLOWED_VAR}: {msg}")),
                other => other,
            })?;

        Ok(Self { bind, policy: Arc::new(policy) })
    }

    /// The shared, immutable allow-list for [`AccessFilter`](crate::AccessFilter).
    pub fn policy(&self) -> Arc<AccessPolicy> {
        Arc::clone(&self.policy)
    }
}
