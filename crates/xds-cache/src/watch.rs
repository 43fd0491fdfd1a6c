//! Watches: pending long-poll subscriptions.
//!
//! A [`Watch`] belongs to one group and one type URL. It ends in exactly one
//! terminal state:
//!
//! - `Resolved`: its callback ran once with a [`Response`]
//! - `Cancelled`: its callback never runs
//!
//! The transition is a compare-and-swap on the state, so a fulfillment
//! racing a cancellation has exactly one winner and the loser is a no-op.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, trace, warn};
use xds_core::{XdsError, XdsResult};

use crate::{Response, XdsRequest};

/// Unique identifier for a watch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

impl WatchId {
    /// Create a new unique watch ID.
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric value of this watch ID.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// Lifecycle of a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchState {
    /// Waiting for a snapshot the subscriber does not have yet.
    Pending = 0,
    /// The callback has been invoked.
    Resolved = 1,
    /// Cancelled before resolution; the callback will never run.
    Cancelled = 2,
}

impl WatchState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Resolved,
            _ => Self::Cancelled,
        }
    }
}

/// Completion callback of a watch.
///
/// Runs while the cache holds the group's lock. It must return quickly and
/// must not call back into the cache for the same group.
pub type ResponseCallback = Box<dyn FnOnce(Response) -> XdsResult<()> + Send>;

pub(crate) type StopFn = Box<dyn FnOnce(WatchId) + Send>;

/// A pending long-poll subscription.
pub struct Watch {
    id: WatchId,
    ads: bool,
    request: XdsRequest,
    state: AtomicU8,
    callback: Mutex<Option<ResponseCallback>>,
    stop: Mutex<Option<StopFn>>,
}

impl fmt::Debug for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("id", &self.id)
            .field("ads", &self.ads)
            .field("type_url", &self.request.type_url())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Watch {
    /// Create a watch invoking `callback` on resolution.
    pub fn new<F>(ads: bool, request: XdsRequest, callback: F) -> Self
    where
        F: FnOnce(Response) -> XdsResult<()> + Send + 'static,
    {
        Self::with_id(WatchId::next(), ads, request, Box::new(callback))
    }

    /// Create a watch forwarding its response over a oneshot channel.
    ///
    /// The callback only sends, so the group lock is never held across
    /// transport work. Resolving after the receiver was dropped fails with
    /// [`XdsError::WatchClosed`].
    pub fn channel(ads: bool, request: XdsRequest) -> (Self, oneshot::Receiver<Response>) {
        let (tx, rx) = oneshot::channel();
        let id = WatchId::next();
        let callback: ResponseCallback = Box::new(move |response| {
            tx.send(response).map_err(|_| XdsError::WatchClosed {
                watch_id: id.as_u64(),
            })
        });
        (Self::with_id(id, ads, request, callback), rx)
    }

    fn with_id(id: WatchId, ads: bool, request: XdsRequest, callback: ResponseCallback) -> Self {
        Self {
            id,
            ads,
            request,
            state: AtomicU8::new(WatchState::Pending as u8),
            callback: Mutex::new(Some(callback)),
            stop: Mutex::new(None),
        }
    }

    /// Get the unique identifier for this watch.
    #[inline]
    pub fn id(&self) -> WatchId {
        self.id
    }

    /// Whether the subscriber multiplexes all types over one stream.
    #[inline]
    pub fn ads(&self) -> bool {
        self.ads
    }

    /// The request that opened this watch.
    #[inline]
    pub fn request(&self) -> &XdsRequest {
        &self.request
    }

    /// Type URL this watch is subscribed to.
    #[inline]
    pub fn type_url(&self) -> &str {
        self.request.type_url()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Still waiting for a response.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.state() == WatchState::Pending
    }

    /// The callback has run.
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.state() == WatchState::Resolved
    }

    /// Cancelled before it could resolve.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state() == WatchState::Cancelled
    }

    fn transition(&self, to: WatchState) -> bool {
        self.state
            .compare_exchange(
                WatchState::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Deliver `response` unless the watch already left `Pending`.
    ///
    /// Returns whether the callback ran. A callback error is returned after
    /// the watch is marked resolved.
    pub(crate) fn respond(&self, response: Response) -> XdsResult<bool> {
        if !self.transition(WatchState::Resolved) {
            match self.state() {
                WatchState::Cancelled => warn!(watch_id = %self.id, "watch cancelled, response dropped"),
                state => trace!(watch_id = %self.id, ?state, "watch already terminal, response dropped"),
            }
            return Ok(false);
        }
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match callback {
            Some(callback) => callback(response).map(|()| true),
            None => Ok(false),
        }
    }

    /// Cancel the watch.
    ///
    /// Removes it from the cache without running the callback. Idempotent;
    /// returns `false` if the watch had already resolved or been cancelled.
    pub fn cancel(&self) -> bool {
        if !self.transition(WatchState::Cancelled) {
            return false;
        }
        drop(
            self.callback
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let stop = self.stop.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(stop) = stop {
            stop(self.id);
        }
        debug!(watch_id = %self.id, type_url = %self.type_url(), "cancelled watch");
        true
    }

    /// Install the hook that detaches this watch from its group on cancel.
    pub(crate) fn set_stop(&self, stop: StopFn) {
        *self.stop.lock().unwrap_or_else(PoisonError::into_inner) = Some(stop);
    }
}
