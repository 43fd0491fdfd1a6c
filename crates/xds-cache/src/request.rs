//! Generation-agnostic discovery request.

use xds_core::XdsNode;
use xds_types::{v2, v3};

/// A discovery request of either protocol generation.
///
/// Exactly one generation is ever present; the cache reads the fields it
/// needs through the accessors without caring which.
#[derive(Clone, Debug, PartialEq)]
pub enum XdsRequest {
    /// `envoy.api.v2` request.
    V2(v2::DiscoveryRequest),
    /// v3 request.
    V3(v3::DiscoveryRequest),
}

macro_rules! field {
    ($self:ident, $request:ident => $expr:expr) => {
        match $self {
            XdsRequest::V2($request) => $expr,
            XdsRequest::V3($request) => $expr,
        }
    };
}

impl XdsRequest {
    /// Type URL of the requested resources.
    pub fn type_url(&self) -> &str {
        field!(self, r => &r.type_url)
    }

    /// Requested names; empty means every resource of the type.
    pub fn resource_names(&self) -> &[String] {
        field!(self, r => &r.resource_names)
    }

    /// Version the subscriber already holds.
    pub fn version_info(&self) -> &str {
        field!(self, r => &r.version_info)
    }

    /// Nonce of the response being acknowledged.
    pub fn response_nonce(&self) -> &str {
        field!(self, r => &r.response_nonce)
    }

    /// Whether the subscriber rejected the previous response.
    pub fn is_nack(&self) -> bool {
        field!(self, r => r.error_detail.is_some())
    }

    /// Identity of the subscriber. A request without one yields an empty node.
    pub fn node(&self) -> XdsNode {
        match self {
            Self::V2(r) => XdsNode::V2(r.node.clone().unwrap_or_default()),
            Self::V3(r) => XdsNode::V3(r.node.clone().unwrap_or_default()),
        }
    }
}

impl From<v2::DiscoveryRequest> for XdsRequest {
    fn from(request: v2::DiscoveryRequest) -> Self {
        Self::V2(request)
    }
}

impl From<v3::DiscoveryRequest> for XdsRequest {
    fn from(request: v3::DiscoveryRequest) -> Self {
        Self::V3(request)
    }
}
