//! Error types for transports and host resolution.

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

/// Errors produced while sending a request through a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying HTTP client failed (connect, protocol, I/O).
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// The client-level timeout elapsed before a response arrived.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A redirect response carried no usable Location.
    #[error("invalid redirect: {0}")]
    InvalidRedirect(String),

    /// The redirect policy limit was reached.
    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),
}

/// Errors produced while resolving registry hosts or probing them.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The host-resolution function could not produce hosts for a name.
    #[error("host lookup for {hostname} failed: {reason}")]
    HostLookup { hostname: String, reason: String },

    /// An image reference could not be parsed.
    #[error("invalid reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// No resolved host has the capability the operation needs.
    #[error("no hosts for {hostname} support {capability}")]
    NoHosts { hostname: String, capability: String },

    /// A request to the registry failed in the transport.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The registry answered with a status the operation does not handle.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: StatusCode, url: String },
}

impl ResolveError {
    /// Shorthand for a host lookup failure.
    pub fn host_lookup(hostname: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HostLookup {
            hostname: hostname.into(),
            reason: reason.into(),
        }
    }
}
