//! Subscriber identity and grouping.
//!
//! Every discovery request carries the identity of the proxy that sent it
//! ([`XdsNode`]). A [`NodeGroup`] policy maps that identity to an opaque
//! group key; all cache state is partitioned by that key. [`NodeHash`] is
//! the default key, an FNV-1a hash of the node id.

use std::fmt;
use std::hash::{Hash, Hasher};

use fnv::FnvHasher;
use xds_types::{v2, v3};

/// Identity a subscriber declared on its request.
///
/// Exactly one protocol generation is populated, by construction.
#[derive(Clone, Debug, PartialEq)]
pub enum XdsNode {
    /// Node from a v2 request.
    V2(v2::Node),
    /// Node from a v3 request.
    V3(v3::Node),
}

impl XdsNode {
    /// The node id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            XdsNode::V2(node) => &node.id,
            XdsNode::V3(node) => &node.id,
        }
    }

    /// The service cluster the node declared.
    #[must_use]
    pub fn cluster(&self) -> &str {
        match self {
            XdsNode::V2(node) => &node.cluster,
            XdsNode::V3(node) => &node.cluster,
        }
    }
}

impl From<v2::Node> for XdsNode {
    fn from(node: v2::Node) -> Self {
        XdsNode::V2(node)
    }
}

impl From<v3::Node> for XdsNode {
    fn from(node: v3::Node) -> Self {
        XdsNode::V3(node)
    }
}

/// Maps a subscriber identity to the group whose snapshot it is served.
///
/// Any `Fn(&XdsNode) -> G` closure is a `NodeGroup`.
pub trait NodeGroup<G>: Send + Sync {
    /// Compute the group key for a node.
    fn hash(&self, node: &XdsNode) -> G;
}

impl<G, F> NodeGroup<G> for F
where
    F: Fn(&XdsNode) -> G + Send + Sync,
{
    fn hash(&self, node: &XdsNode) -> G {
        self(node)
    }
}

/// Groups nodes by the hash of their id: one group per proxy.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeIdGroup;

impl NodeGroup<NodeHash> for NodeIdGroup {
    fn hash(&self, node: &XdsNode) -> NodeHash {
        NodeHash::from_id(node.id())
    }
}

/// Groups nodes by their declared service cluster.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeClusterGroup;

impl NodeGroup<String> for NodeClusterGroup {
    fn hash(&self, node: &XdsNode) -> String {
        node.cluster().to_string()
    }
}

/// Hash-based node identifier for efficient lookup.
///
/// `NodeHash` uses FNV-1a hashing to convert node IDs into fixed-size
/// hash values.
///
/// # Example
///
/// ```rust
/// use xds_core::NodeHash;
///
/// let node1 = NodeHash::from_id("envoy-node-1");
/// let node2 = NodeHash::from_id("envoy-node-2");
///
/// assert_ne!(node1, node2);
/// assert_eq!(node1, NodeHash::from_id("envoy-node-1"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHash(u64);

impl NodeHash {
    /// Create a node hash from a node ID string.
    #[must_use]
    pub fn from_id(node_id: &str) -> Self {
        let mut hasher = FnvHasher::default();
        node_id.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Get the raw hash value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
