//! Static host resolution from configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::client::{HttpClient, RedirectPolicy};
use crate::config::schema::{ClientDefaults, HostConfig, RegistryConfig};
use crate::error::ResolveError;
use crate::registry::{HostCapabilities, HostsFn, RegistryHost};

/// Build a host function from the configured host entries.
///
/// A hostname with configured endpoints resolves to those endpoints in
/// order. A hostname with an entry but no endpoints, or with no entry at
/// all, resolves to its default host. Every host gets a client carrying
/// the configured timeout and redirect policy.
pub fn static_hosts(config: &RegistryConfig) -> HostsFn {
    let defaults = config.defaults.clone();
    let entries: HashMap<String, HostConfig> = config
        .hosts
        .iter()
        .map(|h| (h.hostname.clone(), h.clone()))
        .collect();

    Arc::new(move |hostname: &str| -> Result<Vec<RegistryHost>, ResolveError> {
        if hostname.is_empty() {
            return Err(ResolveError::host_lookup(hostname, "empty hostname"));
        }

        let Some(entry) = entries.get(hostname) else {
            let host = RegistryHost::default_for(hostname).with_client(client_for(&defaults, None));
            return Ok(vec![host]);
        };

        let client = client_for(&defaults, Some(entry));
        let capabilities = entry
            .capabilities
            .iter()
            .filter_map(|c| HostCapabilities::from_name(c))
            .fold(HostCapabilities::empty(), |acc, c| acc | c);
        let headers = header_map(entry).map_err(|reason| ResolveError::host_lookup(hostname, reason))?;

        if entry.endpoints.is_empty() {
            let mut host = RegistryHost::default_for(hostname)
                .with_capabilities(capabilities)
                .with_client(client);
            host.headers = headers;
            return Ok(vec![host]);
        }

        entry
            .endpoints
            .iter()
            .map(|endpoint| -> Result<RegistryHost, ResolveError> {
                let mut host = endpoint_host(endpoint)
                    .map_err(|reason| ResolveError::host_lookup(hostname, reason))?;
                host.capabilities = capabilities;
                host.headers = headers.clone();
                host.client = Some(client.clone());
                Ok(host)
            })
            .collect()
    })
}

fn client_for(defaults: &ClientDefaults, entry: Option<&HostConfig>) -> HttpClient {
    let timeout = entry
        .and_then(|e| e.timeout_secs)
        .unwrap_or(defaults.timeout_secs);
    let max_redirects = entry
        .and_then(|e| e.max_redirects)
        .unwrap_or(defaults.max_redirects);
    let redirect = match max_redirects {
        0 => RedirectPolicy::None,
        n => RedirectPolicy::Limited(n),
    };
    HttpClient::new()
        .with_timeout(Duration::from_secs(timeout))
        .with_redirect(redirect)
}

/// Endpoint URL → host. An endpoint without a path serves the API at `/v2`.
fn endpoint_host(endpoint: &str) -> Result<RegistryHost, String> {
    let url = Url::parse(endpoint).map_err(|e| format!("{endpoint}: {e}"))?;
    let host = url
        .host_str()
        .ok_or_else(|| format!("{endpoint}: no host"))?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let path = match url.path().trim_end_matches('/') {
        "" => "/v2",
        path => path,
    };
    Ok(RegistryHost::new(authority)
        .with_scheme(url.scheme())
        .with_path(path))
}

fn header_map(entry: &HostConfig) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    for (name, value) in &entry.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| format!("header {name:?}: {e}"))?;
        let value = HeaderValue::from_str(value).map_err(|e| format!("header {name}: {e}"))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
