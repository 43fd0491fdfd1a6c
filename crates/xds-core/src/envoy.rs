//! [`Resource`] implementations for the Envoy kinds of both protocol
//! generations.
//!
//! The v2 and v3 messages share one layout, so a single macro implements
//! the capability trait for each generation with its own type URLs.

use std::any::Any;
use std::sync::Arc;

use prost::Message;
use tracing::error;
use xds_types::{type_url, v2, v3};

use crate::resource::{BoxResource, ResourceRegistry, ResourceTypeInfo};
use crate::{Resource, XdsError, XdsResult};

/// Filter names the HTTP connection manager is configured under.
pub const HTTP_CONNECTION_MANAGER_FILTERS: [&str; 2] = [
    "envoy.http_connection_manager",
    "envoy.filters.network.http_connection_manager",
];

/// Pack a message into a type-erased payload.
pub fn pack<M: Message>(type_url: &str, message: &M) -> prost_types::Any {
    prost_types::Any {
        type_url: type_url.to_string(),
        value: message.encode_to_vec(),
    }
}

/// Unpack a nested config, failing loudly when its tag is not `expected`.
fn unpack_config<M: Message + Default>(expected: &str, any: &prost_types::Any) -> XdsResult<M> {
    if any.type_url != expected {
        error!(type_url = %any.type_url, expected, "cannot unpack filter config");
        return Err(XdsError::InvalidTypeUrl {
            type_url: any.type_url.clone(),
            reason: format!("cannot unpack as {expected}"),
        });
    }
    M::decode(any.value.as_slice()).map_err(|err| XdsError::decoding(expected, err))
}

fn decode_as<M>(any: &prost_types::Any) -> XdsResult<BoxResource>
where
    M: Message + Default + Resource + 'static,
{
    let message = M::decode(any.value.as_slice())
        .map_err(|err| XdsError::decoding(any.type_url.as_str(), err))?;
    Ok(Arc::new(message))
}

macro_rules! impl_envoy_resources {
    (
        $gen:ident {
            cluster: $cluster:expr,
            endpoint: $endpoint:expr,
            listener: $listener:expr,
            route: $route:expr,
            secret: $secret:expr,
            http_connection_manager: $hcm:expr $(,)?
        }
    ) => {
        impl Resource for $gen::Cluster {
            fn type_url(&self) -> &str {
                $cluster
            }

            fn name(&self) -> &str {
                &self.name
            }

            /// EDS clusters reference the endpoint assignment named by their
            /// service name override, or by the cluster name itself.
            /// Clusters with embedded membership reference nothing.
            fn references(&self) -> XdsResult<Vec<String>> {
                if self.discovery_type != $gen::DiscoveryType::Eds as i32 {
                    return Ok(Vec::new());
                }
                let service_name = self
                    .eds_cluster_config
                    .as_ref()
                    .map(|config| config.service_name.as_str())
                    .filter(|name| !name.is_empty());
                Ok(vec![service_name.unwrap_or(&self.name).to_string()])
            }

            fn encode(&self) -> XdsResult<prost_types::Any> {
                Ok(pack($cluster, self))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl Resource for $gen::ClusterLoadAssignment {
            fn type_url(&self) -> &str {
                $endpoint
            }

            fn name(&self) -> &str {
                &self.cluster_name
            }

            fn encode(&self) -> XdsResult<prost_types::Any> {
                Ok(pack($endpoint, self))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl Resource for $gen::Listener {
            fn type_url(&self) -> &str {
                $listener
            }

            fn name(&self) -> &str {
                &self.name
            }

            /// Route configurations fetched over RDS by any HTTP connection
            /// manager in the listener's filter chains.
            fn references(&self) -> XdsResult<Vec<String>> {
                let mut names = Vec::new();
                for filter in self.filter_chains.iter().flat_map(|chain| &chain.filters) {
                    if !HTTP_CONNECTION_MANAGER_FILTERS.contains(&filter.name.as_str()) {
                        continue;
                    }
                    let Some(config) = &filter.typed_config else {
                        continue;
                    };
                    let manager: $gen::HttpConnectionManager = unpack_config($hcm, config)?;
                    if let Some(rds) = manager.rds.filter(|rds| !rds.route_config_name.is_empty()) {
                        names.push(rds.route_config_name);
                    }
                }
                Ok(names)
            }

            fn encode(&self) -> XdsResult<prost_types::Any> {
                Ok(pack($listener, self))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl Resource for $gen::RouteConfiguration {
            fn type_url(&self) -> &str {
                $route
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn encode(&self) -> XdsResult<prost_types::Any> {
                Ok(pack($route, self))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl Resource for $gen::Secret {
            fn type_url(&self) -> &str {
                $secret
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn encode(&self) -> XdsResult<prost_types::Any> {
                Ok(pack($secret, self))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

impl_envoy_resources!(v3 {
    cluster: type_url::CLUSTER,
    endpoint: type_url::ENDPOINT,
    listener: type_url::LISTENER,
    route: type_url::ROUTE,
    secret: type_url::SECRET,
    http_connection_manager: type_url::HTTP_CONNECTION_MANAGER,
});

impl_envoy_resources!(v2 {
    cluster: type_url::V2_CLUSTER,
    endpoint: type_url::V2_ENDPOINT,
    listener: type_url::V2_LISTENER,
    route: type_url::V2_ROUTE,
    secret: type_url::V2_SECRET,
    http_connection_manager: type_url::V2_HTTP_CONNECTION_MANAGER,
});

pub(crate) fn register(registry: &mut ResourceRegistry) {
    let types: [(&str, &str, crate::resource::Decoder); 10] = [
        (type_url::CLUSTER, "Cluster Discovery Service (CDS)", decode_as::<v3::Cluster>),
        (type_url::ENDPOINT, "Endpoint Discovery Service (EDS)", decode_as::<v3::ClusterLoadAssignment>),
        (type_url::LISTENER, "Listener Discovery Service (LDS)", decode_as::<v3::Listener>),
        (type_url::ROUTE, "Route Discovery Service (RDS)", decode_as::<v3::RouteConfiguration>),
        (type_url::SECRET, "Secret Discovery Service (SDS)", decode_as::<v3::Secret>),
        (type_url::V2_CLUSTER, "v2 Cluster Discovery Service (CDS)", decode_as::<v2::Cluster>),
        (type_url::V2_ENDPOINT, "v2 Endpoint Discovery Service (EDS)", decode_as::<v2::ClusterLoadAssignment>),
        (type_url::V2_LISTENER, "v2 Listener Discovery Service (LDS)", decode_as::<v2::Listener>),
        (type_url::V2_ROUTE, "v2 Route Discovery Service (RDS)", decode_as::<v2::RouteConfiguration>),
        (type_url::V2_SECRET, "v2 Secret Discovery Service (SDS)", decode_as::<v2::Secret>),
    ];

    for (type_url, description, decode) in types {
        registry.register(ResourceTypeInfo::new(type_url, description, decode));
    }
}
