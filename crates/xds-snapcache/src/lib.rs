//! # xds-snapcache
//!
//! Snapshot cache for xDS control planes.
//!
//! A producer publishes immutable, versioned snapshots of Envoy
//! configuration per subscriber group. Transports open long-poll watches
//! against the cache, which answers each one as soon as the subscriber's
//! view of its requested type differs from the latest snapshot.
//!
//! ## Quick Start
//!
//! ```rust
//! use xds_snapcache::prelude::*;
//! use xds_snapcache::types::v3;
//!
//! # fn main() -> XdsResult<()> {
//! let cache = ShardedCache::new();
//!
//! let snapshot = Snapshot::empty("v1");
//! snapshot.ensure_consistent()?;
//! cache.set_snapshot(NodeHash::from_id("node-1"), snapshot)?;
//!
//! let request = XdsRequest::V3(v3::DiscoveryRequest {
//!     node: Some(v3::Node { id: "node-1".to_string(), ..Default::default() }),
//!     type_url: TypeUrl::CLUSTER.to_string(),
//!     ..Default::default()
//! });
//! let (watch, mut rx) = cache.watch_channel(false, request)?;
//! assert!(watch.is_resolved());
//! assert_eq!(rx.try_recv().map(|r| r.version().to_string()).ok(), Some("v1".to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! This library is organized into several crates:
//!
//! - `xds-types` - Protobuf messages for both protocol generations
//! - `xds-core` - Core types, resource traits, and error handling
//! - `xds-cache` - Snapshot cache, watches and the group reclaimer
//!
//! This crate (`xds-snapcache`) re-exports all public APIs for convenience.
//!
//! ## Design Principles
//!
//! 1. **No panics in library code** - All errors are returned as `Result`
//! 2. **No cross-group contention** - State is sharded by group in a `DashMap`
//! 3. **One capability trait** - Every resource kind implements `Resource`;
//!    protocol generations are just more type URLs
//! 4. **Observable** - Atomic counters and `tracing` spans on every decision

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export all sub-crates
pub use xds_cache as cache;
pub use xds_core as core;
pub use xds_types as types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use xds_snapcache::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use xds_core::{
        BoxResource, NodeClusterGroup, NodeGroup, NodeHash, NodeIdGroup, Resource,
        ResourceRegistry, ResourceVersion, TypeUrl, XdsError, XdsNode, XdsResult,
    };

    // Cache types
    pub use xds_cache::{
        Cache, CacheBuilder, CacheStats, GroupReclaimer, ReclaimConfig, Response,
        ShardedCache, Snapshot, SnapshotBuilder, StatusInfo, Watch, WatchId, WatchState,
        XdsRequest,
    };
}
