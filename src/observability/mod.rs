//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! transport / client / resolver
//!     → logging.rs (structured tracing events, stderr)
//!     → metrics.rs (counters through the `metrics` facade)
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr so stdout carries only user-facing output
//! - Metrics are recorded through the facade; the embedding
//!   application decides whether to install a recorder

pub mod logging;
pub mod metrics;
