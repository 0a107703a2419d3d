//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RegistryConfig (validated, immutable)
//!     → hosts.rs (static HostsFn for the resolver)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks
//! - Hostnames without an entry fall back to the default host

pub mod hosts;
pub mod loader;
pub mod schema;
pub mod validation;

pub use hosts::static_hosts;
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClientDefaults, HostConfig, ObservabilityConfig, RegistryConfig};
