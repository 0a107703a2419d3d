//! Registry host resolution.
//!
//! # Data Flow
//! ```text
//! image reference
//!     → reference.rs (domain + repository)
//!     → HostsFn (host.rs; static from config, or caller supplied)
//!     → [nocheck.rs wraps every host client with SkipHeadLayer]
//!     → resolver.rs (hosts for a domain, blob existence probe)
//! ```
//!
//! # Design Decisions
//! - Host resolution is a plain function so wrappers compose by closure
//! - Hosts carry their own client; nothing is shared implicitly
//! - Wrapping replaces only the transport of each client

pub mod host;
pub mod nocheck;
pub mod reference;
pub mod resolver;

pub use host::{default_hosts, HostCapabilities, HostSummary, HostsFn, RegistryHost};
pub use nocheck::{new_no_check_resolver, no_check_client, wrap_hosts, wrap_hosts_with};
pub use reference::Reference;
pub use resolver::{BlobStatus, Resolver, ResolverOptions};
