//! Name and reference extraction over resources of unknown concrete kind.
//!
//! Every kind implements [`Resource`], so extraction is a dynamic dispatch.
//! Unpacking a type-erased payload goes through a process-wide
//! [`ResourceRegistry`] holding every known Envoy kind.

use std::collections::HashSet;
use std::sync::OnceLock;

use xds_core::{BoxResource, Resource, ResourceRegistry, TypeUrl, XdsResult};

/// Reference relationships checked by [`Snapshot::ensure_consistent`].
///
/// Each pair is `(parent, child)`: names referenced by parent resources
/// must be exactly the names of the child resources. Protocol generations
/// are checked independently.
///
/// [`Snapshot::ensure_consistent`]: crate::Snapshot::ensure_consistent
pub const REFERENCE_PAIRS: [(&str, &str); 4] = [
    (TypeUrl::CLUSTER, TypeUrl::ENDPOINT),
    (TypeUrl::LISTENER, TypeUrl::ROUTE),
    (TypeUrl::V2_CLUSTER, TypeUrl::V2_ENDPOINT),
    (TypeUrl::V2_LISTENER, TypeUrl::V2_ROUTE),
];

/// The registry used for every unpack in this crate.
pub fn registry() -> &'static ResourceRegistry {
    static REGISTRY: OnceLock<ResourceRegistry> = OnceLock::new();
    REGISTRY.get_or_init(ResourceRegistry::with_envoy_types)
}

/// Unpack a type-erased payload.
///
/// An unregistered tag is an integration error and is returned as such.
pub fn unpack(any: &prost_types::Any) -> XdsResult<BoxResource> {
    registry().unpack(any)
}

/// Name of a resource. Kinds the cache does not model have an empty name.
#[inline]
pub fn resource_name(resource: &dyn Resource) -> &str {
    resource.name()
}

/// Deduplicated names referenced by any of `resources`.
pub fn resource_references<'a, I>(resources: I) -> XdsResult<HashSet<String>>
where
    I: IntoIterator<Item = &'a BoxResource>,
{
    let mut names = HashSet::new();
    for resource in resources {
        names.extend(resource.references()?);
    }
    Ok(names)
}
