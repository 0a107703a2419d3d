//! Transport subsystem.
//!
//! # Data Flow
//! ```text
//! HttpClient::execute
//!     → Transport (boxed tower Service)
//!         → skip_head.rs (HEAD answered locally with 404)
//!         → default.rs (hyper-util client, real network I/O)
//!     → Response<Body>
//! ```
//!
//! # Design Decisions
//! - A transport is a plain `tower::Service<Request<Body>>`, so decorators
//!   are ordinary layers
//! - Boxed as `BoxCloneSyncService` so clients and host lists stay `Clone + Send + Sync`
//! - Decorators never change the wrapped service's error type

use axum::body::Body;
use axum::http::{Request, Response};
use tower::util::BoxCloneSyncService;

use crate::error::TransportError;

pub mod default;
pub mod skip_head;

/// The request-sending service underneath an [`HttpClient`](crate::client::HttpClient).
pub type Transport = BoxCloneSyncService<Request<Body>, Response<Body>, TransportError>;

pub use default::{default_transport, HyperTransport};
pub use skip_head::{SkipHeadLayer, SkipHeadService, SkippedRequest};
