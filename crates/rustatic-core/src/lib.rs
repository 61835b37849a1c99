//! Resource model, path sanitization, and caching policy for rustatic.
//!
//! This crate provides the request-independent building blocks of the static
//! file server:
//!
//! - **Configuration** ([`config`]): env-driven server configuration.
//! - **Path sanitization** ([`sanitize`]): percent-decoding and traversal
//!   rejection. The sole security boundary between a raw request path and
//!   the filesystem/archive layer.
//! - **Resource model** ([`resource`]): a closed set of servable resource
//!   variants (filesystem file, archive entry, absent) with metadata
//!   accessors and native-handle acquisition.
//! - **Caching policy** ([`caching`]): conditional-request evaluation and
//!   response caching headers.
//! - **MIME lookup** ([`mime_types`]): process-wide immutable extension
//!   table.
//!
//! # Architecture
//!
//! ```text
//! raw request path
//!        |
//!        v
//!   sanitize::sanitize          (reject traversal / hidden segments)
//!        |
//!        v
//!   ResourceBase::resolve       (file / archive-entry / empty)
//!        |
//!        v
//!   caching::evaluate           (304 short-circuit or fresh headers)
//!        |
//!        v
//!   Resource::open              (acquire the native handle for transfer)
//! ```

pub mod caching;
pub mod config;
pub mod error;
pub mod mime_types;
pub mod resource;
pub mod sanitize;

pub use caching::{CacheDecision, FreshHeaders};
pub use config::ServerConfig;
pub use error::{ServeError, ServeResult};
pub use resource::{Resource, ResourceBase, ResourceStream};
