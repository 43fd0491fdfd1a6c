//! Cache trait and ShardedCache implementation.
//!
//! State is partitioned by group key in a `DashMap`. Each group owns one
//! mutex guarding its snapshot, its pending watches and its status. These
//! operations hold it, and only for their own group:
//!
//! - `create_watch`: status update, version check and parking
//! - `set_snapshot`: snapshot swap and re-evaluation of pending watches
//! - `Watch::cancel`: removal from the pending set
//! - `clear_snapshot` and the reclaimer: recheck and removal
//!
//! A shard lock of the map is held only while cloning a group's `Arc`, never
//! while waiting for a group mutex. Watch callbacks run under the group mutex.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, error, trace, warn};
use xds_core::{NodeGroup, NodeHash, NodeIdGroup, TypeUrl, XdsNode, XdsResult};

use crate::response::Response;
use crate::snapshot::Snapshot;
use crate::stats::CacheStats;
use crate::status::StatusInfo;
use crate::watch::{ResponseCallback, Watch, WatchId};
use crate::XdsRequest;

const DEFAULT_CAPACITY: usize = 64;

/// Bounds every group key satisfies.
pub trait GroupKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> GroupKey for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// Trait for xDS snapshot caches.
///
/// Groups are keyed by `G`, produced from each request's node by the
/// cache's [`NodeGroup`].
pub trait Cache<G>: Send + Sync {
    /// Open a watch for `request`.
    ///
    /// If the group's snapshot carries the requested type at a version other
    /// than the one the request reports, `callback` runs before this returns
    /// and the watch comes back resolved. Otherwise the watch stays pending
    /// until a snapshot changes that version or the watch is cancelled.
    ///
    /// # Errors
    ///
    /// The callback's error, if it ran and failed.
    fn create_watch(
        &self,
        ads: bool,
        request: XdsRequest,
        callback: ResponseCallback,
    ) -> XdsResult<Arc<Watch>>;

    /// Replace the group's snapshot and resolve every pending watch whose
    /// version changed.
    ///
    /// The snapshot is installed as is; validate it with
    /// [`Snapshot::ensure_consistent`] first.
    ///
    /// # Errors
    ///
    /// The first failing callback's error. Remaining watches are still
    /// notified and the snapshot stays installed.
    fn set_snapshot(&self, group: G, snapshot: Snapshot) -> XdsResult<()>;

    /// The group's current snapshot.
    fn get_snapshot(&self, group: &G) -> Option<Arc<Snapshot>>;

    /// Forget the group entirely. Refused while it has outstanding watches.
    fn clear_snapshot(&self, group: &G) -> bool;

    /// Every group the cache holds state for.
    fn groups(&self) -> Vec<G>;

    /// Status of one group.
    fn status_info(&self, group: &G) -> Option<StatusInfo>;
}

#[derive(Debug, Default)]
struct GroupState {
    snapshot: Option<Arc<Snapshot>>,
    watches: HashMap<TypeUrl, HashMap<WatchId, Arc<Watch>>>,
    node: Option<XdsNode>,
    last_request: Option<Instant>,
    /// Set once the entry is removed from the map; holders must look again.
    evicted: bool,
}

impl GroupState {
    fn num_watches(&self) -> usize {
        self.watches.values().map(HashMap::len).sum()
    }

    fn remove_watch(&mut self, type_url: &str, id: WatchId) {
        if let Some(watches) = self.watches.get_mut(type_url) {
            watches.remove(&id);
            if watches.is_empty() {
                self.watches.remove(type_url);
            }
        }
    }
}

#[derive(Debug, Default)]
struct GroupEntry {
    state: Mutex<GroupState>,
}

impl GroupEntry {
    /// A panicking callback must not take the group down with it.
    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.lock().snapshot.clone()
    }

    fn status(&self) -> StatusInfo {
        let state = self.lock();
        StatusInfo {
            node: state.node.clone(),
            last_watch_request_time: state.last_request,
            num_watches: state.num_watches(),
        }
    }
}

/// A snapshot cache sharded by group.
///
/// ## Thread Safety
///
/// All operations are thread-safe. Operations on different groups never
/// contend beyond a brief map shard lookup; operations on the same group
/// are serialized by that group's mutex.
///
/// ## Callbacks
///
/// Watch callbacks run while the group's mutex is held. A callback must
/// not block and must not call back into the cache for its own group,
/// including cancelling a watch of that group. [`Watch::channel`] builds a
/// callback that only hands the response to a oneshot channel.
pub struct ShardedCache<G = NodeHash> {
    groups: DashMap<G, Arc<GroupEntry>>,
    node_group: Arc<dyn NodeGroup<G>>,
    stats: CacheStats,
}

impl<G: GroupKey> fmt::Debug for ShardedCache<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedCache")
            .field("groups", &self.groups.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for ShardedCache<NodeHash> {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardedCache<NodeHash> {
    /// Create a cache grouping subscribers by node id.
    pub fn new() -> Self {
        CacheBuilder::new().build()
    }

    /// Create a cache grouping by node id with a specific initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        CacheBuilder::new().capacity(capacity).build()
    }
}

impl<G: GroupKey> ShardedCache<G> {
    /// Create a cache grouping subscribers with `node_group`.
    pub fn with_node_group(node_group: impl NodeGroup<G> + 'static) -> Self {
        CacheBuilder::with_node_group(node_group).build()
    }

    /// Get cache statistics.
    #[inline]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Number of groups the cache holds state for.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Open a watch whose response is delivered over a oneshot channel.
    ///
    /// If the watch resolves immediately the response is already waiting in
    /// the receiver.
    pub fn watch_channel(
        &self,
        ads: bool,
        request: XdsRequest,
    ) -> XdsResult<(Arc<Watch>, oneshot::Receiver<Response>)> {
        let (watch, rx) = Watch::channel(ads, request);
        Ok((self.open_watch(watch)?, rx))
    }

    /// Open a prebuilt watch. See [`Cache::create_watch`].
    pub fn open_watch(&self, watch: Watch) -> XdsResult<Arc<Watch>> {
        let node = watch.request().node();
        let group = self.node_group.hash(&node);
        let watch = Arc::new(watch);

        self.with_group(&group, |entry, state| {
            state.node = Some(node);
            state.last_request = Some(Instant::now());

            if !watch.is_pending() {
                return Ok(Arc::clone(&watch));
            }

            let type_url = watch.type_url();
            let request = watch.request();
            if let Some(snapshot) = state.snapshot.as_ref().filter(|s| s.contains_type(type_url)) {
                let version = snapshot.resource_version(type_url, request.resource_names());
                if !version.matches(request.version_info()) {
                    debug!(
                        group = ?group,
                        watch_id = %watch.id(),
                        type_url,
                        known = request.version_info(),
                        %version,
                        "responding to watch immediately"
                    );
                    self.stats.record_responses(1);
                    watch
                        .respond(Response::from_snapshot(request, snapshot))
                        .map_err(|err| {
                            error!(group = ?group, watch_id = %watch.id(), error = %err, "watch callback failed");
                            err
                        })?;
                    return Ok(Arc::clone(&watch));
                }
            }

            let weak = Arc::downgrade(entry);
            let key = TypeUrl::new(type_url);
            watch.set_stop(Box::new(move |id| {
                if let Some(entry) = weak.upgrade() {
                    entry.lock().remove_watch(key.as_str(), id);
                }
            }));
            state
                .watches
                .entry(TypeUrl::new(type_url))
                .or_default()
                .insert(watch.id(), Arc::clone(&watch));
            self.stats.record_parked();

            debug!(
                group = ?group,
                watch_id = %watch.id(),
                type_url,
                known = request.version_info(),
                "parked watch"
            );
            Ok(Arc::clone(&watch))
        })
    }

    /// Run `f` under the group's mutex, creating the group if needed.
    fn with_group<R>(
        &self,
        group: &G,
        f: impl FnOnce(&Arc<GroupEntry>, &mut GroupState) -> R,
    ) -> R {
        loop {
            let entry = Arc::clone(self.groups.entry(group.clone()).or_default().value());
            let mut state = entry.lock();
            if state.evicted {
                // Cleared between lookup and lock; the map no longer holds it.
                continue;
            }
            return f(&entry, &mut state);
        }
    }

    /// Remove the group if `should_clear` holds under its mutex.
    fn clear_group(&self, group: &G, should_clear: impl FnOnce(&GroupState) -> bool) -> bool {
        let Some(entry) = self.groups.get(group).map(|e| Arc::clone(e.value())) else {
            return false;
        };
        let mut state = entry.lock();
        if state.evicted || !should_clear(&state) {
            return false;
        }
        state.evicted = true;
        state.snapshot = None;
        self.groups.remove_if(group, |_, current| Arc::ptr_eq(current, &entry));
        self.stats.record_clear();
        true
    }

    /// Clear the group if it has no outstanding watches and its last request
    /// is more than `idle_after` before `now`.
    ///
    /// Groups that never received a request are kept.
    pub(crate) fn clear_if_idle(&self, group: &G, now: Instant, idle_after: Duration) -> bool {
        self.clear_group(group, |state| {
            state.num_watches() == 0
                && state
                    .last_request
                    .is_some_and(|last| now.saturating_duration_since(last) > idle_after)
        })
    }
}

impl<G: GroupKey> Cache<G> for ShardedCache<G> {
    fn create_watch(
        &self,
        ads: bool,
        request: XdsRequest,
        callback: ResponseCallback,
    ) -> XdsResult<Arc<Watch>> {
        self.open_watch(Watch::new(ads, request, callback))
    }

    fn set_snapshot(&self, group: G, snapshot: Snapshot) -> XdsResult<()> {
        let snapshot = Arc::new(snapshot);
        self.stats.record_set();

        self.with_group(&group, |_, state| {
            state.snapshot = Some(Arc::clone(&snapshot));
            debug!(
                group = ?group,
                version = snapshot.version(),
                resources = snapshot.total_resources(),
                "set snapshot"
            );

            let mut responses = 0;
            let mut first_error = None;
            for (type_url, watches) in &mut state.watches {
                watches.retain(|_, watch| {
                    if !watch.is_pending() {
                        return false;
                    }
                    let request = watch.request();
                    let version = snapshot.resource_version(type_url.as_str(), request.resource_names());
                    if version.matches(request.version_info()) {
                        trace!(group = ?group, watch_id = %watch.id(), %type_url, %version, "watch up to date");
                        return true;
                    }

                    debug!(group = ?group, watch_id = %watch.id(), %type_url, %version, "responding to watch");
                    match watch.respond(Response::from_snapshot(request, &snapshot)) {
                        Ok(sent) => responses += u64::from(sent),
                        Err(err) => {
                            error!(group = ?group, watch_id = %watch.id(), error = %err, "watch callback failed");
                            first_error.get_or_insert(err);
                        }
                    }
                    false
                });
            }
            state.watches.retain(|_, watches| !watches.is_empty());
            self.stats.record_responses(responses);

            first_error.map_or(Ok(()), Err)
        })
    }

    fn get_snapshot(&self, group: &G) -> Option<Arc<Snapshot>> {
        let snapshot = self
            .groups
            .get(group)
            .map(|e| Arc::clone(e.value()))
            .and_then(|entry| entry.snapshot());

        if snapshot.is_some() {
            self.stats.record_hit();
            trace!(group = ?group, "cache hit");
        } else {
            self.stats.record_miss();
            trace!(group = ?group, "cache miss");
        }
        snapshot
    }

    fn clear_snapshot(&self, group: &G) -> bool {
        let cleared = self.clear_group(group, |state| {
            let watches = state.num_watches();
            if watches > 0 {
                warn!(group = ?group, watches, "refusing to clear group with outstanding watches");
            }
            watches == 0
        });
        if cleared {
            debug!(group = ?group, "cleared group");
        }
        cleared
    }

    fn groups(&self) -> Vec<G> {
        self.groups.iter().map(|r| r.key().clone()).collect()
    }

    fn status_info(&self, group: &G) -> Option<StatusInfo> {
        self.groups
            .get(group)
            .map(|e| Arc::clone(e.value()))
            .map(|entry| entry.status())
    }
}

/// Builder for creating a configured cache.
pub struct CacheBuilder<G = NodeHash> {
    capacity: usize,
    node_group: Arc<dyn NodeGroup<G>>,
}

impl<G> fmt::Debug for CacheBuilder<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl Default for CacheBuilder<NodeHash> {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBuilder<NodeHash> {
    /// Create a builder grouping subscribers by node id.
    pub fn new() -> Self {
        Self::with_node_group(NodeIdGroup)
    }
}

impl<G: GroupKey> CacheBuilder<G> {
    /// Create a builder grouping subscribers with `node_group`.
    pub fn with_node_group(node_group: impl NodeGroup<G> + 'static) -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            node_group: Arc::new(node_group),
        }
    }

    /// Set the initial group capacity.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Replace the node group resolver, changing the group key type.
    pub fn node_group<H: GroupKey>(self, node_group: impl NodeGroup<H> + 'static) -> CacheBuilder<H> {
        CacheBuilder {
            capacity: self.capacity,
            node_group: Arc::new(node_group),
        }
    }

    /// Build the cache.
    pub fn build(self) -> ShardedCache<G> {
        ShardedCache {
            groups: DashMap::with_capacity(self.capacity),
            node_group: self.node_group,
            stats: CacheStats::new(),
        }
    }
}
