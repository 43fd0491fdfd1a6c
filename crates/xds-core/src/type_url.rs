//! Type URL handling for xDS resources.
//!
//! Type URLs identify both the logical kind of a resource and its protocol
//! generation. The cache treats them purely as dictionary keys.

use std::borrow::Borrow;
use std::fmt;

/// Type URL wrapper for xDS resource types.
///
/// Two generations of the same kind are distinct type URLs.
///
/// # Example
///
/// ```rust
/// use xds_core::TypeUrl;
///
/// let cluster_type = TypeUrl::new(TypeUrl::CLUSTER);
/// assert_eq!(cluster_type.short_name(), "Cluster");
/// assert_ne!(TypeUrl::CLUSTER, TypeUrl::V2_CLUSTER);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeUrl(String);

impl TypeUrl {
    /// Type URL for v3 Cluster (CDS).
    pub const CLUSTER: &'static str = xds_types::type_url::CLUSTER;

    /// Type URL for v3 ClusterLoadAssignment (EDS).
    pub const ENDPOINT: &'static str = xds_types::type_url::ENDPOINT;

    /// Type URL for v3 Listener (LDS).
    pub const LISTENER: &'static str = xds_types::type_url::LISTENER;

    /// Type URL for v3 RouteConfiguration (RDS).
    pub const ROUTE: &'static str = xds_types::type_url::ROUTE;

    /// Type URL for v3 Secret (SDS).
    pub const SECRET: &'static str = xds_types::type_url::SECRET;

    /// Type URL for v2 Cluster (CDS).
    pub const V2_CLUSTER: &'static str = xds_types::type_url::V2_CLUSTER;

    /// Type URL for v2 ClusterLoadAssignment (EDS).
    pub const V2_ENDPOINT: &'static str = xds_types::type_url::V2_ENDPOINT;

    /// Type URL for v2 Listener (LDS).
    pub const V2_LISTENER: &'static str = xds_types::type_url::V2_LISTENER;

    /// Type URL for v2 RouteConfiguration (RDS).
    pub const V2_ROUTE: &'static str = xds_types::type_url::V2_ROUTE;

    /// Type URL for v2 Secret (SDS).
    pub const V2_SECRET: &'static str = xds_types::type_url::V2_SECRET;

    /// Every resource type URL the cache serves, v3 first.
    pub const ALL: [&'static str; 10] = [
        Self::CLUSTER,
        Self::ENDPOINT,
        Self::LISTENER,
        Self::ROUTE,
        Self::SECRET,
        Self::V2_CLUSTER,
        Self::V2_ENDPOINT,
        Self::V2_LISTENER,
        Self::V2_ROUTE,
        Self::V2_SECRET,
    ];

    /// Create a new type URL from a string.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Get the type URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the short name from the type URL.
    ///
    /// For example, `type.googleapis.com/envoy.config.cluster.v3.Cluster`
    /// returns `Cluster`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0.rsplit('/').next().and_then(|s| s.rsplit('.').next()).unwrap_or(&self.0)
    }

    /// Check if this is a valid xDS type URL.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.starts_with("type.googleapis.com/")
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TypeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TypeUrl {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TypeUrl {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<TypeUrl> for String {
    fn from(t: TypeUrl) -> Self {
        t.0
    }
}

impl AsRef<str> for TypeUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by `TypeUrl` be queried with a plain `&str`.
impl Borrow<str> for TypeUrl {
    fn borrow(&self) -> &str {
        &self.0
    }
}
