//! Per-group status used for observability and reclamation.

use std::time::Instant;

use xds_core::XdsNode;

/// What the cache knows about a group's subscribers.
///
/// Never consulted when matching watches.
#[derive(Clone, Debug, Default)]
pub struct StatusInfo {
    pub(crate) node: Option<XdsNode>,
    pub(crate) last_watch_request_time: Option<Instant>,
    pub(crate) num_watches: usize,
}

impl StatusInfo {
    /// Identity of the most recent subscriber.
    pub fn node(&self) -> Option<&XdsNode> {
        self.node.as_ref()
    }

    /// When the group last received a request, if ever.
    pub fn last_watch_request_time(&self) -> Option<Instant> {
        self.last_watch_request_time
    }

    /// Outstanding watches across all types.
    pub fn num_watches(&self) -> usize {
        self.num_watches
    }
}
