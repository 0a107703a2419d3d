//! Resolver: host lookup plus the blob existence probe a push starts with.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};

use crate::error::{ResolveError, TransportError};
use crate::observability::metrics;
use crate::registry::host::{default_hosts, HostCapabilities, HostsFn, RegistryHost};
use crate::registry::reference::Reference;
use crate::transport::SkippedRequest;

/// Options a [`Resolver`] is built from.
#[derive(Clone)]
pub struct ResolverOptions {
    /// Host-resolution function.
    pub hosts: HostsFn,
    /// Headers sent with every request, before per-host headers.
    pub headers: HeaderMap,
}

impl ResolverOptions {
    pub fn new(hosts: HostsFn) -> Self {
        Self {
            hosts,
            headers: HeaderMap::new(),
        }
    }
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::new(default_hosts())
    }
}

/// Outcome of a blob existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobStatus {
    /// The registry already has the blob.
    Exists { size: Option<u64> },
    /// The blob must be uploaded.
    Missing,
}

/// Maps registry hostnames to hosts and their clients.
#[derive(Clone)]
pub struct Resolver {
    hosts: HostsFn,
    headers: HeaderMap,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            hosts: options.hosts,
            headers: options.headers,
        }
    }

    /// Hosts serving `hostname`, each with its client configured.
    pub fn hosts(&self, hostname: &str) -> Result<Vec<RegistryHost>, ResolveError> {
        (self.hosts)(hostname)
    }

    /// Hosts serving `hostname` that support `capability`.
    pub fn hosts_with(
        &self,
        hostname: &str,
        capability: HostCapabilities,
    ) -> Result<Vec<RegistryHost>, ResolveError> {
        let hosts: Vec<_> = self
            .hosts(hostname)?
            .into_iter()
            .filter(|h| h.capabilities.contains(capability))
            .collect();
        if hosts.is_empty() {
            return Err(ResolveError::NoHosts {
                hostname: hostname.to_string(),
                capability: capability.to_string(),
            });
        }
        Ok(hosts)
    }

    /// Ask the push hosts whether `digest` already exists in the repository.
    ///
    /// Hosts are tried in order. A 200 or 404 is final; any other status or
    /// transport failure moves on to the next host, and the last failure is
    /// returned if none answers.
    pub async fn blob_exists(
        &self,
        reference: &Reference,
        digest: &str,
    ) -> Result<BlobStatus, ResolveError> {
        let hosts = self.hosts_with(&reference.domain, HostCapabilities::PUSH)?;
        let mut last_error = None;

        for host in hosts {
            let url = format!("{}/{}/blobs/{}", host.base_url(), reference.repository, digest);
            let req = self.head_request(&host, &url)?;
            let client = host.client.clone().unwrap_or_default();

            match client.execute(req).await {
                Ok(response) => match response.status() {
                    StatusCode::OK => {
                        let size = response
                            .headers()
                            .get(header::CONTENT_LENGTH)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse().ok());
                        tracing::debug!(url = %url, size = ?size, "Blob exists");
                        metrics::record_blob_check("exists");
                        return Ok(BlobStatus::Exists { size });
                    }
                    StatusCode::NOT_FOUND => {
                        let skipped = response.extensions().get::<SkippedRequest>().is_some();
                        tracing::debug!(url = %url, skipped, "Blob missing");
                        metrics::record_blob_check(if skipped { "skipped" } else { "missing" });
                        return Ok(BlobStatus::Missing);
                    }
                    status => {
                        tracing::warn!(url = %url, status = %status, "Unexpected blob check status");
                        last_error = Some(ResolveError::UnexpectedStatus { status, url });
                    }
                },
                Err(e) => {
                    tracing::warn!(url = %url, host = %host.host, error = %e, "Blob check failed");
                    last_error = Some(e.into());
                }
            }
        }

        metrics::record_blob_check("error");
        Err(last_error.unwrap_or_else(|| ResolveError::NoHosts {
            hostname: reference.domain.clone(),
            capability: HostCapabilities::PUSH.to_string(),
        }))
    }

    fn head_request(&self, host: &RegistryHost, url: &str) -> Result<Request<Body>, ResolveError> {
        let mut builder = Request::builder().method(Method::HEAD).uri(url);
        if let Some(headers) = builder.headers_mut() {
            for (k, v) in self.headers.iter() {
                headers.append(k.clone(), v.clone());
            }
            // A header the host sets replaces every resolver-level value.
            for k in host.headers.keys() {
                headers.remove(k);
            }
            for (k, v) in host.headers.iter() {
                headers.append(k.clone(), v.clone());
            }
        }
        builder
            .body(Body::empty())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()).into())
    }
}
