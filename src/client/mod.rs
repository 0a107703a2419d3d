//! HTTP client built on a pluggable [`Transport`].
//!
//! # Responsibilities
//! - Hold the per-host client settings: transport, redirect policy,
//!   cookie jar, timeout
//! - Send requests through the transport, falling back to the default
//!   transport when none is set
//! - Apply the timeout, cookies and redirect policy around the transport
//!
//! # Design Decisions
//! - Settings are public fields so host wrappers can rebuild a client
//!   field by field
//! - Only GET and HEAD follow redirects; bodies are never replayed

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Response};
use reqwest::cookie::CookieStore;
use tower::ServiceExt;
use url::Url;

use crate::error::TransportError;
use crate::transport::{default_transport, Transport};

pub mod redirect;

pub use redirect::RedirectPolicy;

/// Per-host HTTP client settings.
#[derive(Clone, Default)]
pub struct HttpClient {
    /// Request-sending service. `None` means the default transport.
    pub transport: Option<Transport>,
    /// Redirect handling.
    pub redirect: RedirectPolicy,
    /// Cookie storage shared across requests.
    pub cookie_jar: Option<Arc<dyn CookieStore>>,
    /// Deadline for a whole exchange, redirects included.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("transport", &self.transport.as_ref().map(|_| "<transport>"))
            .field("redirect", &self.redirect)
            .field("cookie_jar", &self.cookie_jar.as_ref().map(|_| "<jar>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn with_cookie_jar(mut self, jar: Arc<dyn CookieStore>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send a request and return the final response.
    pub async fn execute(&self, req: Request<Body>) -> Result<Response<Body>, TransportError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.send(req))
                .await
                .map_err(|_| TransportError::Timeout(limit))?,
            None => self.send(req).await,
        }
    }

    async fn send(&self, mut req: Request<Body>) -> Result<Response<Body>, TransportError> {
        let transport = self.transport.clone().unwrap_or_else(default_transport);
        let mut redirects = 0;

        loop {
            let url = Url::parse(&req.uri().to_string())
                .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", req.uri(), e)))?;
            self.attach_cookies(&mut req, &url);

            let method = req.method().clone();
            let headers = req.headers().clone();
            let response = transport.clone().oneshot(req).await?;
            self.store_cookies(&response, &url);

            if !redirect::is_redirect(response.status()) || !redirect::is_replayable(&method) {
                return Ok(response);
            }
            let limit = match self.redirect {
                RedirectPolicy::None => return Ok(response),
                RedirectPolicy::Limited(limit) => limit,
            };
            if redirects >= limit {
                return Err(TransportError::TooManyRedirects(redirects));
            }

            let next = redirect::location(&response, &url)?;
            tracing::debug!(from = %url, to = %next, status = %response.status(), "Following redirect");

            let mut builder = Request::builder().method(method).uri(next.as_str());
            if let Some(h) = builder.headers_mut() {
                *h = redirect::forward_headers(&headers, &url, &next);
            }
            req = builder
                .body(Body::empty())
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            redirects += 1;
        }
    }

    fn attach_cookies(&self, req: &mut Request<Body>, url: &Url) {
        let Some(jar) = &self.cookie_jar else { return };
        if req.headers().contains_key(header::COOKIE) {
            return;
        }
        if let Some(value) = jar.cookies(url) {
            req.headers_mut().insert(header::COOKIE, value);
        }
    }

    fn store_cookies(&self, response: &Response<Body>, url: &Url) {
        let Some(jar) = &self.cookie_jar else { return };
        let mut set_cookies = response.headers().get_all(header::SET_COOKIE).iter();
        jar.set_cookies(&mut set_cookies, url);
    }
}
