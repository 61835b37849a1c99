//! HTTP serving pipeline for rustatic.
//!
//! This crate provides the HTTP layer of the static file server. It
//! handles:
//!
//! - **Body** ([`body`]): the [`StaticBody`](body::StaticBody) response
//!   body supporting empty, buffered, file-region, and channel-pumped
//!   streaming modes.
//!
//! - **Transfer** ([`transfer`]): the transfer strategies (zero-copy
//!   region vs bounded chunked reads), completion handles, and the
//!   exactly-once release of native handles on every exit path.
//!
//! - **Response** ([`response`]): caching/conditional header assembly,
//!   plain-text error responses, and transport-failure translation.
//!
//! - **Service** ([`service`]): the
//!   [`StaticFileService`](service::StaticFileService) implementing
//!   hyper's `Service` trait, tying sanitization, resolution, caching,
//!   and transfer together, with a pass-on-fail fallback chain.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> StaticFileService (hyper Service)
//!     -> Health check interception
//!     -> Oversized-target guard
//!     -> Method filter (GET/HEAD)
//!     -> sanitize -> ResourceBase::resolve
//!     -> caching::evaluate (304 short-circuit)
//!     -> response headers + start_transfer (GET body)
//!     -> connection-close policy (keep-alive / 304 / errors)
//!   <- HTTP Response
//! ```

pub mod body;
pub mod response;
pub mod service;
pub mod transfer;

// Re-export key types for convenience.
pub use body::StaticBody;
pub use response::{TransportFailure, classify_hyper_error, translate_failure};
pub use service::{FallbackHandler, StaticFileService, StaticHttpConfig};
pub use transfer::{TransferHandle, TransferOutcome, start_transfer};
