//! Registry client plumbing that skips blob existence checks.
//!
//! # Architecture Overview
//!
//! ```text
//!   hostname ──▶ HostsFn ──▶ [wrap_hosts] ──▶ Resolver ──▶ push pipeline
//!                  │              │
//!               config        SkipHeadLayer
//!              (static)     HEAD → local 404
//!                               │
//!                   other methods ▼
//!                          HttpClient ──▶ Transport ──▶ registry
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod registry;
pub mod transport;

pub use client::{HttpClient, RedirectPolicy};
pub use config::RegistryConfig;
pub use error::{ResolveError, TransportError};
pub use registry::{new_no_check_resolver, wrap_hosts, RegistryHost, Resolver, ResolverOptions};
pub use transport::{SkipHeadLayer, SkipHeadService, Transport};
