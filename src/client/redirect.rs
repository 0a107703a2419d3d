//! Redirect handling for [`HttpClient`](super::HttpClient).

use axum::http::{header, HeaderMap, Method, Response, StatusCode};
use url::Url;

use crate::error::TransportError;

/// How many redirects a client follows before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    /// Return redirect responses to the caller as-is.
    None,
    /// Follow up to this many redirects, then fail.
    Limited(usize),
}

impl RedirectPolicy {
    /// Matches the usual client default of ten hops.
    pub const DEFAULT_LIMIT: usize = 10;
}

impl Default for RedirectPolicy {
    fn default() -> Self {
        RedirectPolicy::Limited(Self::DEFAULT_LIMIT)
    }
}

/// Only bodiless requests are replayed; others get the redirect response back.
pub(crate) fn is_replayable(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

pub(crate) fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolve the Location of a redirect response against the request URL.
pub(crate) fn location<B>(response: &Response<B>, current: &Url) -> Result<Url, TransportError> {
    let value = response
        .headers()
        .get(header::LOCATION)
        .ok_or_else(|| TransportError::InvalidRedirect(format!("{} without Location", response.status())))?;
    let value = value
        .to_str()
        .map_err(|_| TransportError::InvalidRedirect("non-ASCII Location".to_string()))?;
    current
        .join(value)
        .map_err(|e| TransportError::InvalidRedirect(format!("{value}: {e}")))
}

/// Headers to carry onto the next hop.
///
/// Cookies are re-derived from the jar per hop. Credentials are dropped
/// when the redirect leaves the original host.
pub(crate) fn forward_headers(headers: &HeaderMap, from: &Url, to: &Url) -> HeaderMap {
    let mut next = headers.clone();
    next.remove(header::COOKIE);
    next.remove(header::HOST);
    if from.host_str() != to.host_str() {
        next.remove(header::AUTHORIZATION);
        next.remove(header::WWW_AUTHENTICATE);
        next.remove(header::PROXY_AUTHORIZATION);
    }
    next
}
