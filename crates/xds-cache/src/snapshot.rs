//! Snapshot: immutable collection of xDS resources.
//!
//! A snapshot represents a consistent view of all resources for a group
//! at a specific version. Snapshots are:
//!
//! - **Immutable**: Once created, a snapshot cannot be modified
//! - **Versioned**: Each type carries a version, or a resolver computing one
//!   from the requested names
//! - **Type-organized**: Resources are grouped by their type URL

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use tracing::debug;
use xds_core::{BoxResource, ResourceVersion, TypeUrl, XdsError, XdsResult};

use crate::resources::{resource_references, unpack, REFERENCE_PAIRS};

/// Computes the version of a resource type for a set of requested names.
///
/// Any `Fn(&[String]) -> String` closure is a resolver.
pub trait ResourceVersionResolver: Send + Sync {
    /// Version served to a subscriber requesting `resource_names`.
    fn version(&self, resource_names: &[String]) -> String;
}

impl<F> ResourceVersionResolver for F
where
    F: Fn(&[String]) -> String + Send + Sync,
{
    fn version(&self, resource_names: &[String]) -> String {
        self(resource_names)
    }
}

#[derive(Clone)]
enum VersionSource {
    Fixed(ResourceVersion),
    Resolver(Arc<dyn ResourceVersionResolver>),
}

impl fmt::Debug for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(version) => f.debug_tuple("Fixed").field(version).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Resources for a specific type within a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotResources {
    version: VersionSource,
    /// Resources keyed by name.
    resources: HashMap<String, BoxResource>,
}

impl Default for SnapshotResources {
    fn default() -> Self {
        Self::new("")
    }
}

impl SnapshotResources {
    /// Create a new empty resource collection.
    pub fn new(version: impl Into<ResourceVersion>) -> Self {
        Self {
            version: VersionSource::Fixed(version.into()),
            resources: HashMap::new(),
        }
    }

    /// Create an empty collection whose version depends on the requested names.
    pub fn with_resolver(resolver: impl ResourceVersionResolver + 'static) -> Self {
        Self {
            version: VersionSource::Resolver(Arc::new(resolver)),
            resources: HashMap::new(),
        }
    }

    /// Insert a resource under its own name, replacing any previous one.
    pub fn insert(&mut self, resource: BoxResource) {
        self.resources.insert(resource.name().to_string(), resource);
    }

    /// Version served to a subscriber requesting `resource_names`.
    ///
    /// Fixed versions ignore the names.
    pub fn version(&self, resource_names: &[String]) -> ResourceVersion {
        match &self.version {
            VersionSource::Fixed(version) => version.clone(),
            VersionSource::Resolver(resolver) => resolver.version(resource_names).into(),
        }
    }

    /// Get the number of resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if there are no resources.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Get a resource by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&BoxResource> {
        self.resources.get(name)
    }

    /// Check whether a resource with this name exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// The resources keyed by name.
    #[inline]
    pub fn as_map(&self) -> &HashMap<String, BoxResource> {
        &self.resources
    }

    /// Resources a subscriber asked for.
    ///
    /// An empty request means every resource. Requested names that do not
    /// exist are skipped, and each resource appears at most once.
    pub fn filtered(&self, resource_names: &[String]) -> Vec<BoxResource> {
        if resource_names.is_empty() {
            return self.resources.values().cloned().collect();
        }
        let wanted: HashSet<&str> = resource_names.iter().map(String::as_str).collect();
        self.resources
            .iter()
            .filter(|(name, _)| wanted.contains(name.as_str()))
            .map(|(_, resource)| Arc::clone(resource))
            .collect()
    }
}

fn empty_resources() -> &'static HashMap<String, BoxResource> {
    static EMPTY: OnceLock<HashMap<String, BoxResource>> = OnceLock::new();
    EMPTY.get_or_init(HashMap::new)
}

/// An immutable snapshot of xDS resources for a group.
///
/// Snapshots are the unit the cache stores and replaces wholesale. Each
/// contains resources organized by type, with per-type versioning.
/// Lookups by a type URL the snapshot does not carry return empty results.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Global version for this snapshot.
    version: String,
    /// Resources grouped by type URL.
    resources: HashMap<TypeUrl, SnapshotResources>,
    /// Creation timestamp.
    created_at: Instant,
}

impl Snapshot {
    /// Create a new snapshot builder.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// A snapshot carrying every v3 kind with no resources.
    pub fn empty(version: impl Into<String>) -> Self {
        [
            TypeUrl::CLUSTER,
            TypeUrl::ENDPOINT,
            TypeUrl::LISTENER,
            TypeUrl::ROUTE,
            TypeUrl::SECRET,
        ]
        .into_iter()
        .fold(Self::builder().version(version), |builder, type_url| {
            builder.resources(type_url, Vec::new())
        })
        .build()
    }

    /// Get the global version of this snapshot.
    #[inline]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the creation timestamp.
    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Resources of one type keyed by name; empty for an unknown type.
    pub fn resources(&self, type_url: &str) -> &HashMap<String, BoxResource> {
        match self.resources.get(type_url) {
            Some(resources) => resources.as_map(),
            None => empty_resources(),
        }
    }

    /// Get the resource collection for a specific type.
    #[inline]
    pub fn get_resources(&self, type_url: &str) -> Option<&SnapshotResources> {
        self.resources.get(type_url)
    }

    /// Version of one type for the requested names; empty for an unknown type.
    pub fn resource_version(&self, type_url: &str, resource_names: &[String]) -> ResourceVersion {
        self.resources
            .get(type_url)
            .map_or_else(ResourceVersion::empty, |r| r.version(resource_names))
    }

    /// Check if this snapshot contains a specific resource type.
    #[inline]
    pub fn contains_type(&self, type_url: &str) -> bool {
        self.resources.contains_key(type_url)
    }

    /// Get all type URLs present in this snapshot.
    pub fn type_urls(&self) -> impl Iterator<Item = &TypeUrl> {
        self.resources.keys()
    }

    /// Get the total number of resources across all types.
    pub fn total_resources(&self) -> usize {
        self.resources.values().map(SnapshotResources::len).sum()
    }

    /// Check if this snapshot is empty (no resources).
    pub fn is_empty(&self) -> bool {
        self.resources.values().all(SnapshotResources::is_empty)
    }

    /// Check that every reference resolves inside this snapshot.
    ///
    /// For each `(parent, child)` pair in [`REFERENCE_PAIRS`], the names
    /// referenced by the parent resources must be exactly the child names:
    /// a missing child fails, and so does a child nobody references. A
    /// type the snapshot does not carry counts as empty.
    ///
    /// # Errors
    ///
    /// [`XdsError::InconsistentSnapshot`] naming both types, the sorted
    /// references and the sorted child names. Reference extraction errors
    /// are returned as is.
    pub fn ensure_consistent(&self) -> XdsResult<()> {
        for (parent, child) in REFERENCE_PAIRS {
            let references = resource_references(self.resources(parent).values())?;
            let children = self.resources(child);

            let size_matches = references.len() == children.len();
            let missing = references.iter().find(|name| !children.contains_key(*name));
            if size_matches && missing.is_none() {
                continue;
            }

            let reason = match missing {
                Some(name) if size_matches => format!(
                    "{} named '{}', referenced by a {}, not listed",
                    TypeUrl::new(child).short_name(),
                    name,
                    TypeUrl::new(parent).short_name()
                ),
                _ => format!(
                    "mismatched reference and resource lengths, {} != {}",
                    references.len(),
                    children.len()
                ),
            };

            let mut references: Vec<String> = references.into_iter().collect();
            references.sort_unstable();
            let mut resources: Vec<String> = children.keys().cloned().collect();
            resources.sort_unstable();

            debug!(parent, child, %reason, "snapshot failed consistency check");
            return Err(XdsError::InconsistentSnapshot {
                parent_type_url: parent.to_string(),
                child_type_url: child.to_string(),
                references,
                resources,
                reason,
            });
        }
        Ok(())
    }
}

/// Builder for creating snapshots.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    version: String,
    resources: HashMap<TypeUrl, SnapshotResources>,
}

impl SnapshotBuilder {
    /// Create a new snapshot builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global version for this snapshot.
    ///
    /// Types added afterwards without their own version inherit it.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add resources of a specific type.
    ///
    /// The version for this resource type defaults to the global version.
    pub fn resources(
        self,
        type_url: impl Into<TypeUrl>,
        resources: impl IntoIterator<Item = BoxResource>,
    ) -> Self {
        let version = self.version.clone();
        self.resources_with_version(type_url, version, resources)
    }

    /// Add resources of a specific type with a custom version.
    pub fn resources_with_version(
        self,
        type_url: impl Into<TypeUrl>,
        version: impl Into<ResourceVersion>,
        resources: impl IntoIterator<Item = BoxResource>,
    ) -> Self {
        self.collection(type_url, SnapshotResources::new(version), resources)
    }

    /// Add resources of a specific type whose version depends on the
    /// names a subscriber requests.
    pub fn resources_with_resolver(
        self,
        type_url: impl Into<TypeUrl>,
        resolver: impl ResourceVersionResolver + 'static,
        resources: impl IntoIterator<Item = BoxResource>,
    ) -> Self {
        self.collection(type_url, SnapshotResources::with_resolver(resolver), resources)
    }

    /// Add type-erased resources, unpacking each through the registry.
    ///
    /// # Errors
    ///
    /// Fails on the first payload whose tag is not registered or whose
    /// bytes do not decode.
    pub fn packed_resources<'a>(
        self,
        type_url: impl Into<TypeUrl>,
        version: impl Into<ResourceVersion>,
        payloads: impl IntoIterator<Item = &'a prost_types::Any>,
    ) -> XdsResult<Self> {
        let resources = payloads
            .into_iter()
            .map(unpack)
            .collect::<XdsResult<Vec<_>>>()?;
        Ok(self.resources_with_version(type_url, version, resources))
    }

    fn collection(
        mut self,
        type_url: impl Into<TypeUrl>,
        mut collection: SnapshotResources,
        resources: impl IntoIterator<Item = BoxResource>,
    ) -> Self {
        for resource in resources {
            collection.insert(resource);
        }
        self.resources.insert(type_url.into(), collection);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        Snapshot {
            version: self.version,
            resources: self.resources,
            created_at: Instant::now(),
        }
    }
}
