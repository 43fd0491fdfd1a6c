//! # xds-cache
//!
//! Snapshot cache and watch-matching engine for xDS control planes.
//!
//! This crate provides the caching layer between a configuration producer
//! and the transport serving discovery requests:
//!
//! - [`Snapshot`] - Immutable, versioned bundle of resources for a group,
//!   with [`Snapshot::ensure_consistent`] checking cross-type references
//! - [`ShardedCache`] - Per-group state machine matching long-poll
//!   [`Watch`]es against the latest snapshot
//! - [`GroupReclaimer`] - Periodic eviction of idle groups
//! - [`resources`] - Name and reference extraction over any resource kind
//!
//! ## Key Design Decisions
//!
//! - Uses `DashMap` so groups never contend with each other
//! - Each group is guarded by its own mutex; a watch is checked and parked
//!   under it so a concurrent snapshot can never be missed
//! - Snapshots are immutable and replaced wholesale; the cache compares
//!   version strings and never diffs content
//! - Watch callbacks run under the group mutex; [`Watch::channel`] hands
//!   responses off to a oneshot channel instead
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use xds_cache::{Cache, ShardedCache, Snapshot, XdsRequest};
//! use xds_core::{BoxResource, NodeHash, TypeUrl};
//! use xds_types::v3;
//!
//! # fn main() -> xds_core::XdsResult<()> {
//! let cache = ShardedCache::new();
//!
//! // An Envoy asks for listeners it has never seen
//! let request = XdsRequest::V3(v3::DiscoveryRequest {
//!     node: Some(v3::Node { id: "node-1".to_string(), ..Default::default() }),
//!     type_url: TypeUrl::LISTENER.to_string(),
//!     ..Default::default()
//! });
//! let (watch, mut rx) = cache.watch_channel(false, request)?;
//! assert!(watch.is_pending());
//!
//! // The producer publishes a snapshot for that node
//! let listener: BoxResource = Arc::new(v3::Listener {
//!     name: "ingress".to_string(),
//!     ..Default::default()
//! });
//! let snapshot = Snapshot::builder()
//!     .version("v1")
//!     .resources(TypeUrl::LISTENER, vec![listener])
//!     .build();
//! snapshot.ensure_consistent()?;
//! cache.set_snapshot(NodeHash::from_id("node-1"), snapshot)?;
//!
//! let response = rx.try_recv().expect("watch resolved");
//! assert_eq!(response.version(), "v1");
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod reclaim;
mod request;
pub mod resources;
mod response;
mod snapshot;
mod stats;
mod status;
mod watch;

pub use cache::{Cache, CacheBuilder, GroupKey, ShardedCache};
pub use reclaim::{EvictionObserver, GroupReclaimer, ReclaimConfig};
pub use request::XdsRequest;
pub use response::Response;
pub use snapshot::{ResourceVersionResolver, Snapshot, SnapshotBuilder, SnapshotResources};
pub use stats::CacheStats;
pub use status::StatusInfo;
pub use watch::{ResponseCallback, Watch, WatchId, WatchState};
