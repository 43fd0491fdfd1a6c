//! # xds-core
//!
//! Core types, traits, and error handling for the xDS snapshot cache.
//!
//! This crate provides the foundational types used across the other crates:
//!
//! - [`XdsError`] - Error type with gRPC status code mapping
//! - [`ResourceVersion`] - Version strings compared by the cache
//! - [`NodeHash`] - Efficient node identification using FNV-1a hashing
//! - [`XdsNode`] / [`NodeGroup`] - Subscriber identity and its mapping to a group key
//! - [`Resource`] - Capability trait implemented by every resource kind
//! - [`ResourceRegistry`] - Unpacks type-erased payloads into resources
//! - [`TypeUrl`] - Type URL handling and constants
//!
//! ## Example
//!
//! ```rust
//! use xds_core::{NodeGroup, NodeHash, NodeIdGroup, ResourceVersion, XdsNode};
//! use xds_types::v3;
//!
//! let node = XdsNode::V3(v3::Node {
//!     id: "my-envoy-node".to_string(),
//!     ..Default::default()
//! });
//!
//! // Group subscribers by node id
//! let group = NodeIdGroup.hash(&node);
//! assert_eq!(group, NodeHash::from_id("my-envoy-node"));
//!
//! let version = ResourceVersion::new("v1");
//! assert!(!version.is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod envoy;
mod error;
mod node;
mod resource;
mod type_url;
mod version;

pub use error::XdsError;
pub use node::{NodeClusterGroup, NodeGroup, NodeHash, NodeIdGroup, XdsNode};
pub use resource::{BoxResource, Decoder, OpaqueResource, Resource, ResourceRegistry, ResourceTypeInfo};
pub use type_url::TypeUrl;
pub use version::ResourceVersion;

/// Result type alias using [`XdsError`].
pub type Result<T> = std::result::Result<T, XdsError>;

/// Alias for [`Result`] used by the cache crates.
pub type XdsResult<T> = Result<T>;
