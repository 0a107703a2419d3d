//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoints must be absolute http(s) URLs
//! - Capabilities and header names must be recognizable
//! - Timeouts must be non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RegistryConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::{HostConfig, RegistryConfig};
use crate::registry::HostCapabilities;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("hosts[{0}]: hostname is empty")]
    EmptyHostname(usize),

    #[error("{0}: hostname configured more than once")]
    DuplicateHostname(String),

    #[error("{hostname}: endpoint {endpoint:?} {reason}")]
    InvalidEndpoint {
        hostname: String,
        endpoint: String,
        reason: String,
    },

    #[error("{hostname}: unknown capability {capability:?}")]
    UnknownCapability { hostname: String, capability: String },

    #[error("{hostname}: invalid header {name:?}")]
    InvalidHeader { hostname: String, name: String },

    #[error("{0}: timeout_secs must be greater than zero")]
    ZeroTimeout(String),
}

pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if config.defaults.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("defaults".to_string()));
    }

    for (index, host) in config.hosts.iter().enumerate() {
        if host.hostname.trim().is_empty() {
            errors.push(ValidationError::EmptyHostname(index));
            continue;
        }
        if !seen.insert(host.hostname.as_str()) {
            errors.push(ValidationError::DuplicateHostname(host.hostname.clone()));
        }
        validate_host(host, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_host(host: &HostConfig, errors: &mut Vec<ValidationError>) {
    let hostname = &host.hostname;

    for endpoint in &host.endpoints {
        if let Err(reason) = check_endpoint(endpoint) {
            errors.push(ValidationError::InvalidEndpoint {
                hostname: hostname.clone(),
                endpoint: endpoint.clone(),
                reason,
            });
        }
    }

    for capability in &host.capabilities {
        if HostCapabilities::from_name(capability).is_none() {
            errors.push(ValidationError::UnknownCapability {
                hostname: hostname.clone(),
                capability: capability.clone(),
            });
        }
    }

    for (name, value) in &host.headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() || HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeader {
                hostname: hostname.clone(),
                name: name.clone(),
            });
        }
    }

    if host.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout(hostname.clone()));
    }
}

fn check_endpoint(endpoint: &str) -> Result<(), String> {
    let url = Url::parse(endpoint).map_err(|e| format!("is not a URL: {e}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("has unsupported scheme {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("has no host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}
