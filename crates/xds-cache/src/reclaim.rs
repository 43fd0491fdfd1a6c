//! Periodic reclamation of idle groups.
//!
//! A group is idle when its last request is older than
//! [`ReclaimConfig::collect_after`] and it has no outstanding watches. The
//! recheck and the removal happen under the group's mutex, so a request
//! arriving between the scan and the clear keeps the group alive.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tokio::sync::watch;
//! use xds_cache::{GroupReclaimer, ReclaimConfig, ShardedCache};
//!
//! # async fn example() -> xds_core::XdsResult<()> {
//! let cache = Arc::new(ShardedCache::new());
//! let config = ReclaimConfig::default().with_collect_after(Duration::from_secs(600));
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let handle = GroupReclaimer::new(Arc::clone(&cache), config)?
//!     .on_evict(|group| println!("reclaimed {group}"))
//!     .spawn(shutdown_rx);
//!
//! // Later, trigger shutdown
//! let _ = shutdown_tx.send(true);
//! let _ = handle.await;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use xds_core::{NodeHash, XdsError, XdsResult};

use crate::cache::{Cache, GroupKey, ShardedCache};

const DEFAULT_INTERVAL_SECS: u64 = 60;
const DEFAULT_COLLECT_AFTER_SECS: u64 = 300;

/// Configuration for the group reclaimer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimConfig {
    /// How often to sweep (default: 60 seconds).
    pub interval: Duration,
    /// How long a group may go without requests before it is reclaimed
    /// (default: 5 minutes).
    pub collect_after: Duration,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            collect_after: Duration::from_secs(DEFAULT_COLLECT_AFTER_SECS),
        }
    }
}

impl ReclaimConfig {
    /// Set the sweep interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the idle threshold.
    pub fn with_collect_after(mut self, collect_after: Duration) -> Self {
        self.collect_after = collect_after;
        self
    }

    /// Reject settings the sweep loop cannot run with.
    pub fn validate(&self) -> XdsResult<()> {
        if self.interval.is_zero() {
            return Err(XdsError::Configuration(
                "reclaim interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Called once for every group the reclaimer clears.
pub type EvictionObserver<G> = Arc<dyn Fn(&G) + Send + Sync>;

/// Clears idle, watch-free groups from a [`ShardedCache`].
pub struct GroupReclaimer<G = NodeHash> {
    cache: Arc<ShardedCache<G>>,
    config: ReclaimConfig,
    observers: Vec<EvictionObserver<G>>,
}

impl<G> fmt::Debug for GroupReclaimer<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupReclaimer")
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl<G: GroupKey> GroupReclaimer<G> {
    /// Create a reclaimer for `cache`.
    ///
    /// # Errors
    ///
    /// [`XdsError::Configuration`] if `config` is invalid.
    pub fn new(cache: Arc<ShardedCache<G>>, config: ReclaimConfig) -> XdsResult<Self> {
        config.validate()?;
        Ok(Self {
            cache,
            config,
            observers: Vec::new(),
        })
    }

    /// Register an observer called after each eviction.
    pub fn on_evict(mut self, observer: impl Fn(&G) + Send + Sync + 'static) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ReclaimConfig {
        &self.config
    }

    /// Sweep once now. Returns the evicted groups.
    pub fn sweep(&self) -> Vec<G> {
        self.sweep_at(Instant::now())
    }

    /// Sweep once as if the current time were `now`.
    pub fn sweep_at(&self, now: Instant) -> Vec<G> {
        let evicted: Vec<G> = self
            .cache
            .groups()
            .into_iter()
            .filter(|group| {
                self.cache
                    .clear_if_idle(group, now, self.config.collect_after)
            })
            .collect();

        for group in &evicted {
            info!(group = ?group, "reclaimed idle group");
            for observer in &self.observers {
                observer(group);
            }
        }
        evicted
    }

    /// Sweep every interval until `shutdown` turns true or its sender is
    /// dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            collect_after_secs = self.config.collect_after.as_secs_f64(),
            "group reclaimer started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let evicted = self.sweep();
                    debug!(evicted = evicted.len(), groups = self.cache.group_count(), "reclaim sweep done");
                }
            }
        }

        info!("group reclaimer stopped");
    }

    /// Run on the current tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
