//! Resource version strings.
//!
//! The cache never inspects resource content to detect change. It compares
//! the version a subscriber reports against the version the current
//! snapshot computes for the same type and names, and trusts the producer
//! to bump versions whenever content changes.

use std::fmt;

/// Version identifier for a set of xDS resources.
///
/// An empty version is what a subscriber reports before it has accepted
/// any response.
///
/// # Example
///
/// ```rust
/// use xds_core::ResourceVersion;
///
/// let v1 = ResourceVersion::new("v1");
/// assert!(v1.matches("v1"));
/// assert!(!v1.matches(""));
/// assert!(ResourceVersion::empty().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceVersion(String);

impl ResourceVersion {
    /// Create a new resource version from a string.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Create an empty resource version (initial state).
    #[must_use]
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Check if the version is empty (initial state).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a subscriber reporting `known` already holds this version.
    #[must_use]
    pub fn matches(&self, known: &str) -> bool {
        self.0 == known
    }

    /// Get the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceVersion {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceVersion {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<ResourceVersion> for String {
    fn from(v: ResourceVersion) -> Self {
        v.0
    }
}

impl AsRef<str> for ResourceVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResourceVersion {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResourceVersion {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
