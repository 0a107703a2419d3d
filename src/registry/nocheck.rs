//! Resolver factory that never asks a registry whether a blob exists.
//!
//! Wraps a host-resolution function so every client it hands out sends
//! through [`SkipHeadLayer`]. HEAD probes are answered locally with 404,
//! so a push uploads every layer instead of checking first.

use std::sync::Arc;

use tower::util::BoxCloneSyncService;
use tower::Layer;

use crate::client::HttpClient;
use crate::error::ResolveError;
use crate::registry::host::{HostsFn, RegistryHost};
use crate::registry::resolver::{Resolver, ResolverOptions};
use crate::transport::{default_transport, SkipHeadLayer};

/// Build a resolver whose hosts never see HEAD requests.
pub fn new_no_check_resolver(mut options: ResolverOptions) -> Resolver {
    options.hosts = wrap_hosts(options.hosts);
    Resolver::new(options)
}

/// Wrap `hosts` so each returned host's client skips HEAD requests.
pub fn wrap_hosts(hosts: HostsFn) -> HostsFn {
    wrap_hosts_with(hosts, SkipHeadLayer::new())
}

/// Like [`wrap_hosts`], with a custom decorator (e.g. a different notice label).
pub fn wrap_hosts_with(hosts: HostsFn, layer: SkipHeadLayer) -> HostsFn {
    Arc::new(move |hostname: &str| -> Result<Vec<RegistryHost>, ResolveError> {
        let mut resolved = hosts(hostname)?;
        for host in resolved.iter_mut() {
            let original = host.client.take().unwrap_or_default();
            host.client = Some(no_check_client(original, &layer));
            tracing::debug!(hostname, host = %host.host, "Installed HEAD-skipping transport");
        }
        Ok(resolved)
    })
}

/// Rebuild `original` with its transport wrapped by `layer`.
///
/// A client without a transport gets the default one underneath. Redirect
/// policy, cookie jar and timeout carry over unchanged.
pub fn no_check_client(original: HttpClient, layer: &SkipHeadLayer) -> HttpClient {
    let base = original.transport.unwrap_or_else(default_transport);
    HttpClient {
        transport: Some(BoxCloneSyncService::new(layer.layer(base))),
        redirect: original.redirect,
        cookie_jar: original.cookie_jar,
        timeout: original.timeout,
    }
}
