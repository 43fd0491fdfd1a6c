//! Response delivered to a resolved watch.

use xds_core::{BoxResource, ResourceVersion, XdsResult};

use crate::{Snapshot, XdsRequest};

/// Resources of one type at one version, filtered to what the request named.
#[derive(Clone, Debug)]
pub struct Response {
    request: XdsRequest,
    version: ResourceVersion,
    resources: Vec<BoxResource>,
}

impl Response {
    /// Create a response to `request`.
    pub fn new(request: XdsRequest, version: ResourceVersion, resources: Vec<BoxResource>) -> Self {
        Self {
            request,
            version,
            resources,
        }
    }

    /// Build the response `snapshot` gives to `request` right now.
    pub(crate) fn from_snapshot(request: &XdsRequest, snapshot: &Snapshot) -> Self {
        let type_url = request.type_url();
        let names = request.resource_names();
        let resources = snapshot
            .get_resources(type_url)
            .map(|r| r.filtered(names))
            .unwrap_or_default();
        Self::new(
            request.clone(),
            snapshot.resource_version(type_url, names),
            resources,
        )
    }

    /// The request this answers.
    #[inline]
    pub fn request(&self) -> &XdsRequest {
        &self.request
    }

    /// Type URL of the resources.
    #[inline]
    pub fn type_url(&self) -> &str {
        self.request.type_url()
    }

    /// Version of the resources.
    #[inline]
    pub fn version(&self) -> &ResourceVersion {
        &self.version
    }

    /// The resources.
    #[inline]
    pub fn resources(&self) -> &[BoxResource] {
        &self.resources
    }

    /// Pack every resource for the wire.
    pub fn encode_resources(&self) -> XdsResult<Vec<prost_types::Any>> {
        self.resources.iter().map(|r| r.encode()).collect()
    }
}
