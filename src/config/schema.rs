//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Answer blob existence checks locally instead of asking the registry.
    pub skip_existing_layers_check: bool,

    /// Client settings applied when a host entry does not override them.
    pub defaults: ClientDefaults,

    /// Per-hostname endpoint lists.
    pub hosts: Vec<HostConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Client settings shared by all hosts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientDefaults {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,

    /// Redirects to follow; 0 returns redirects to the caller.
    pub max_redirects: usize,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

/// Endpoints serving one registry hostname.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Registry domain as it appears in image references (e.g. "docker.io").
    pub hostname: String,

    /// Endpoint URLs tried in order. Empty means the default endpoint.
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Capabilities of every endpoint in this entry.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,

    /// Overrides `defaults.timeout_secs`.
    pub timeout_secs: Option<u64>,

    /// Overrides `defaults.max_redirects`.
    pub max_redirects: Option<usize>,

    /// Extra headers for requests to these endpoints.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_capabilities() -> Vec<String> {
    vec!["pull".to_string(), "resolve".to_string(), "push".to_string()]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
