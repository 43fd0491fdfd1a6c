//! Resource trait and registry for xDS resources.
//!
//! This module provides the [`Resource`] capability trait every resource
//! kind implements, and [`ResourceRegistry`] for unpacking type-erased
//! payloads into resources.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::error;

use crate::{TypeUrl, XdsError, XdsResult};

/// Trait for xDS resources.
///
/// The cache only needs two capabilities from a resource: its name, and
/// the names of the resources of other types it depends on. Each concrete
/// kind implements them; protocol generations are just distinct kinds.
///
/// # Example
///
/// ```rust
/// use std::any::Any as StdAny;
/// use xds_core::{Resource, TypeUrl, XdsResult};
///
/// #[derive(Debug)]
/// struct MySecret {
///     name: String,
/// }
///
/// impl Resource for MySecret {
///     fn type_url(&self) -> &str {
///         TypeUrl::SECRET
///     }
///
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     fn encode(&self) -> XdsResult<prost_types::Any> {
///         Ok(prost_types::Any {
///             type_url: self.type_url().to_string(),
///             value: vec![], // actual encoding would go here
///         })
///     }
///
///     fn as_any(&self) -> &dyn StdAny {
///         self
///     }
/// }
/// ```
pub trait Resource: Send + Sync + fmt::Debug {
    /// Get the type URL for this resource.
    fn type_url(&self) -> &str;

    /// Get the resource name.
    ///
    /// This is the key the resource is stored and requested under. For
    /// endpoint assignments it is the name of the cluster they serve.
    fn name(&self) -> &str;

    /// Names of resources of a dependent type this resource references.
    ///
    /// Fails only when a nested type-erased config cannot be unpacked.
    fn references(&self) -> XdsResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Encode the resource to a protobuf Any message.
    fn encode(&self) -> XdsResult<prost_types::Any>;

    /// Convert to Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// Type alias for a shared resource.
/// Uses Arc for efficient cloning and sharing across snapshots.
pub type BoxResource = Arc<dyn Resource>;

/// A payload of a kind the cache does not model.
///
/// Its name is empty unless one is supplied, so it never satisfies a
/// reference check.
#[derive(Debug, Clone)]
pub struct OpaqueResource {
    name: String,
    any: prost_types::Any,
}

impl OpaqueResource {
    /// Wrap a payload without a known name.
    #[must_use]
    pub fn new(any: prost_types::Any) -> Self {
        Self {
            name: String::new(),
            any,
        }
    }

    /// Attach the name the resource should be served under.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Resource for OpaqueResource {
    fn type_url(&self) -> &str {
        &self.any.type_url
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self) -> XdsResult<prost_types::Any> {
        Ok(self.any.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Decodes a payload of one registered type.
pub type Decoder = fn(&prost_types::Any) -> XdsResult<BoxResource>;

/// Information about a registered resource type.
#[derive(Clone)]
pub struct ResourceTypeInfo {
    /// The type URL.
    pub type_url: String,
    /// Short name for the type.
    pub short_name: String,
    /// Description of the resource type.
    pub description: String,
    /// Decoder for payloads tagged with `type_url`.
    pub decode: Decoder,
}

impl fmt::Debug for ResourceTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceTypeInfo")
            .field("type_url", &self.type_url)
            .field("short_name", &self.short_name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl ResourceTypeInfo {
    /// Describe a type whose short name is derived from its URL.
    #[must_use]
    pub fn new(type_url: &str, description: impl Into<String>, decode: Decoder) -> Self {
        Self {
            type_url: type_url.to_string(),
            short_name: TypeUrl::new(type_url).short_name().to_string(),
            description: description.into(),
            decode,
        }
    }
}

/// Registry for resource types.
///
/// Maps type URLs to the decoder for that kind. Unpacking a payload whose
/// tag is not registered is an error: it means the producer and the cache
/// disagree about which kinds exist.
#[derive(Debug, Default, Clone)]
pub struct ResourceRegistry {
    types: HashMap<String, ResourceTypeInfo>,
}

impl ResourceRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with every v2 and v3 Envoy kind.
    #[must_use]
    pub fn with_envoy_types() -> Self {
        let mut registry = Self::new();
        crate::envoy::register(&mut registry);
        registry
    }

    /// Register a new resource type.
    pub fn register(&mut self, info: ResourceTypeInfo) {
        self.types.insert(info.type_url.clone(), info);
    }

    /// Get information about a resource type by type URL.
    #[must_use]
    pub fn get(&self, type_url: &str) -> Option<&ResourceTypeInfo> {
        self.types.get(type_url)
    }

    /// Check if a type URL is registered.
    #[must_use]
    pub fn contains(&self, type_url: &str) -> bool {
        self.types.contains_key(type_url)
    }

    /// Get all registered type URLs.
    #[must_use]
    pub fn type_urls(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Get the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Decode a type-erased payload into a resource.
    pub fn unpack(&self, any: &prost_types::Any) -> XdsResult<BoxResource> {
        match self.types.get(&any.type_url) {
            Some(info) => (info.decode)(any),
            None => {
                error!(type_url = %any.type_url, "cannot unpack payload of unregistered type");
                Err(XdsError::InvalidTypeUrl {
                    type_url: any.type_url.clone(),
                    reason: "cannot unpack: no resource type registered".to_string(),
                })
            }
        }
    }
}
