//! Registry host descriptions and the host-resolution function type.

use std::fmt;
use std::net::IpAddr;
use std::ops::BitOr;
use std::sync::Arc;

use axum::http::HeaderMap;
use serde::Serialize;

use crate::client::{HttpClient, RedirectPolicy};
use crate::error::ResolveError;

/// Maps a hostname to the registry hosts serving it, in preference order.
pub type HostsFn = Arc<dyn Fn(&str) -> Result<Vec<RegistryHost>, ResolveError> + Send + Sync>;

/// Hub's API lives on a different host than its image domain.
pub const DOCKER_HUB_DOMAIN: &str = "docker.io";
pub const DOCKER_HUB_API_HOST: &str = "registry-1.docker.io";

/// Operations a host may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HostCapabilities(u8);

impl HostCapabilities {
    pub const PULL: Self = Self(1);
    pub const RESOLVE: Self = Self(1 << 1);
    pub const PUSH: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(Self::PULL.0 | Self::RESOLVE.0 | Self::PUSH.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Parse a single capability name (`pull`, `resolve`, `push`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pull" => Some(Self::PULL),
            "resolve" => Some(Self::RESOLVE),
            "push" => Some(Self::PUSH),
            _ => None,
        }
    }

    pub fn names(self) -> Vec<&'static str> {
        [(Self::PULL, "pull"), (Self::RESOLVE, "resolve"), (Self::PUSH, "push")]
            .into_iter()
            .filter(|(cap, _)| self.contains(*cap))
            .map(|(_, name)| name)
            .collect()
    }
}

impl BitOr for HostCapabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for HostCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join("|"))
    }
}

/// One endpoint able to serve a registry domain.
#[derive(Debug, Clone)]
pub struct RegistryHost {
    /// Authority (`host[:port]`).
    pub host: String,
    /// `http` or `https`.
    pub scheme: String,
    /// API root, usually `/v2`.
    pub path: String,
    pub capabilities: HostCapabilities,
    /// Extra headers sent with every request to this host.
    pub headers: HeaderMap,
    /// Client used for requests to this host. `None` means a default client.
    pub client: Option<HttpClient>,
}

impl RegistryHost {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: "https".to_string(),
            path: "/v2".to_string(),
            capabilities: HostCapabilities::all(),
            headers: HeaderMap::new(),
            client: None,
        }
    }

    /// The host used when nothing is configured for `hostname`.
    ///
    /// Docker Hub is served from its API host; loopback registries are
    /// assumed to speak plain HTTP.
    pub fn default_for(hostname: &str) -> Self {
        let host = if hostname == DOCKER_HUB_DOMAIN {
            DOCKER_HUB_API_HOST
        } else {
            hostname
        };
        let mut registry_host = Self::new(host);
        if is_localhost(hostname) {
            registry_host.scheme = "http".to_string();
        }
        registry_host
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = Some(client);
        self
    }

    /// `scheme://host/path`, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.host, self.path.trim_end_matches('/'))
    }
}

/// True for `localhost` and loopback addresses, with or without a port.
pub fn is_localhost(hostname: &str) -> bool {
    let host = match hostname.strip_prefix('[') {
        Some(rest) => rest.split(']').next().unwrap_or(rest),
        None => hostname.rsplit_once(':').map_or(hostname, |(h, port)| {
            if port.chars().all(|c| c.is_ascii_digit()) { h } else { hostname }
        }),
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}

/// Host function that returns [`RegistryHost::default_for`] for every name.
pub fn default_hosts() -> HostsFn {
    Arc::new(|hostname: &str| {
        if hostname.is_empty() {
            return Err(ResolveError::host_lookup(hostname, "empty hostname"));
        }
        Ok(vec![RegistryHost::default_for(hostname)])
    })
}

/// Serializable view of a host for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct HostSummary {
    pub url: String,
    pub capabilities: Vec<&'static str>,
    pub headers: Vec<String>,
    pub timeout_ms: Option<u128>,
    pub max_redirects: Option<usize>,
    pub cookie_jar: bool,
    /// A transport is installed on the client (set for every wrapped host).
    pub transport_set: bool,
}

impl From<&RegistryHost> for HostSummary {
    fn from(host: &RegistryHost) -> Self {
        let client = host.client.clone().unwrap_or_default();
        Self {
            url: host.base_url(),
            capabilities: host.capabilities.names(),
            headers: host.headers.keys().map(|k| k.to_string()).collect(),
            timeout_ms: client.timeout.map(|t| t.as_millis()),
            max_redirects: match client.redirect {
                RedirectPolicy::None => None,
                RedirectPolicy::Limited(n) => Some(n),
            },
            cookie_jar: client.cookie_jar.is_some(),
            transport_set: client.transport.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let caps = HostCapabilities::PULL | HostCapabilities::RESOLVE;
        assert!(caps.contains(HostCapabilities::PULL));
        assert!(!caps.contains(HostCapabilities::PUSH));
        assert!(HostCapabilities::all().contains(caps));
        assert_eq!(caps.to_string(), "pull|resolve");
        assert_eq!(HostCapabilities::from_name("Push"), Some(HostCapabilities::PUSH));
        assert_eq!(HostCapabilities::from_name("delete"), None);
    }

    #[test]
    fn test_default_host_docker_hub() {
        let host = RegistryHost::default_for("docker.io");
        assert_eq!(host.base_url(), "https://registry-1.docker.io/v2");
        assert_eq!(host.capabilities, HostCapabilities::all());
        assert!(host.client.is_none());
    }

    #[test]
    fn test_default_host_localhost_is_plain_http() {
        assert_eq!(RegistryHost::default_for("localhost:5000").scheme, "http");
        assert_eq!(RegistryHost::default_for("127.0.0.1:5000").scheme, "http");
        assert_eq!(RegistryHost::default_for("[::1]:5000").scheme, "http");
        assert_eq!(RegistryHost::default_for("ghcr.io").scheme, "https");
    }

    #[test]
    fn test_default_hosts_rejects_empty() {
        let hosts = default_hosts();
        assert!(hosts("").is_err());
        assert_eq!(hosts("quay.io").unwrap().len(), 1);
    }

    #[test]
    fn test_summary_reports_installed_transport() {
        let plain = default_hosts()("ghcr.io").unwrap();
        let summary = HostSummary::from(&plain[0]);
        assert_eq!(summary.url, "https://ghcr.io/v2");
        assert!(!summary.transport_set);
        assert_eq!(summary.max_redirects, Some(10));

        let wrapped = crate::registry::wrap_hosts(default_hosts())("ghcr.io").unwrap();
        let summary = HostSummary::from(&wrapped[0]);
        assert!(summary.transport_set);
        assert!(!summary.cookie_jar);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["transport_set"], true);
        assert!(json.get("custom_transport").is_none());
    }
}
