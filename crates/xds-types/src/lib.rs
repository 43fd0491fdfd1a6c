//! # xds-types
//!
//! Protobuf message types for the xDS resources distributed by the cache.
//!
//! Only the fields the control plane reads or writes are modelled; field
//! numbers follow the Envoy data-plane API so payloads round-trip through
//! `prost_types::Any` with real proxies for the subset that is present.
//!
//! Two protocol generations are provided side by side:
//!
//! - [`v2`] - the `envoy.api.v2` messages
//! - [`v3`] - the v3 messages
//!
//! Both generations share one message layout, generated by a single macro,
//! so code written against one compiles against the other.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)] // Generated code doesn't have docs

// Re-export prost types for convenience
pub use prost::Message;
pub use prost_types::Any;

macro_rules! xds_messages {
    () => {
        /// Identity a proxy declares on every discovery request.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Node {
            /// Node identifier.
            #[prost(string, tag = "1")]
            pub id: String,
            /// Service cluster the node belongs to.
            #[prost(string, tag = "2")]
            pub cluster: String,
            /// Locality.
            #[prost(message, optional, tag = "4")]
            pub locality: Option<Locality>,
            /// User agent name.
            #[prost(string, tag = "6")]
            pub user_agent_name: String,
        }

        /// Locality information.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Locality {
            #[prost(string, tag = "1")]
            pub region: String,
            #[prost(string, tag = "2")]
            pub zone: String,
            #[prost(string, tag = "3")]
            pub sub_zone: String,
        }

        /// Discovery request sent by clients.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct DiscoveryRequest {
            /// Version info from the last accepted response (empty on first request).
            #[prost(string, tag = "1")]
            pub version_info: String,
            /// Node information.
            #[prost(message, optional, tag = "2")]
            pub node: Option<Node>,
            /// Requested resource names (empty for wildcard).
            #[prost(string, repeated, tag = "3")]
            pub resource_names: Vec<String>,
            /// Type URL of requested resources.
            #[prost(string, tag = "4")]
            pub type_url: String,
            /// Nonce from the last response.
            #[prost(string, tag = "5")]
            pub response_nonce: String,
            /// Error details if this is a NACK.
            #[prost(message, optional, tag = "6")]
            pub error_detail: Option<crate::google::rpc::Status>,
        }

        /// Where a proxy fetches dynamic configuration from.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ConfigSource {
            /// Fetch over the aggregated discovery stream.
            #[prost(message, optional, tag = "3")]
            pub ads: Option<AggregatedConfigSource>,
        }

        /// Marker selecting the aggregated discovery stream.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct AggregatedConfigSource {}

        /// Service discovery type of a cluster.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum DiscoveryType {
            Static = 0,
            StrictDns = 1,
            LogicalDns = 2,
            Eds = 3,
            OriginalDst = 4,
        }

        /// Upstream cluster configuration.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Cluster {
            /// Cluster name.
            #[prost(string, tag = "1")]
            pub name: String,
            /// How cluster membership is discovered.
            #[prost(enumeration = "DiscoveryType", tag = "2")]
            pub discovery_type: i32,
            /// EDS settings, used when `discovery_type` is EDS.
            #[prost(message, optional, tag = "3")]
            pub eds_cluster_config: Option<EdsClusterConfig>,
            #[prost(message, optional, tag = "4")]
            pub connect_timeout: Option<::prost_types::Duration>,
            /// Statically embedded membership.
            #[prost(message, optional, tag = "33")]
            pub load_assignment: Option<ClusterLoadAssignment>,
        }

        /// EDS settings of a cluster.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct EdsClusterConfig {
            #[prost(message, optional, tag = "1")]
            pub eds_config: Option<ConfigSource>,
            /// Overrides the cluster name when requesting endpoints.
            #[prost(string, tag = "2")]
            pub service_name: String,
        }

        /// Endpoints serving a cluster.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct ClusterLoadAssignment {
            /// Name of the cluster these endpoints belong to.
            #[prost(string, tag = "1")]
            pub cluster_name: String,
            #[prost(message, repeated, tag = "2")]
            pub endpoints: Vec<LocalityLbEndpoints>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct LocalityLbEndpoints {
            #[prost(message, optional, tag = "1")]
            pub locality: Option<Locality>,
            #[prost(message, repeated, tag = "2")]
            pub lb_endpoints: Vec<LbEndpoint>,
            #[prost(uint32, tag = "5")]
            pub priority: u32,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct LbEndpoint {
            #[prost(message, optional, tag = "1")]
            pub endpoint: Option<Endpoint>,
            #[prost(int32, tag = "2")]
            pub health_status: i32,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Endpoint {
            #[prost(message, optional, tag = "1")]
            pub address: Option<Address>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Address {
            #[prost(message, optional, tag = "1")]
            pub socket_address: Option<SocketAddress>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct SocketAddress {
            #[prost(int32, tag = "1")]
            pub protocol: i32,
            #[prost(string, tag = "2")]
            pub address: String,
            #[prost(uint32, tag = "3")]
            pub port_value: u32,
        }

        /// Listener configuration.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Listener {
            /// Listener name.
            #[prost(string, tag = "1")]
            pub name: String,
            /// Address to listen on.
            #[prost(message, optional, tag = "2")]
            pub address: Option<Address>,
            #[prost(message, repeated, tag = "3")]
            pub filter_chains: Vec<FilterChain>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct FilterChain {
            #[prost(message, repeated, tag = "3")]
            pub filters: Vec<Filter>,
        }

        /// Network filter with a type-erased configuration.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Filter {
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(message, optional, tag = "4")]
            pub typed_config: Option<::prost_types::Any>,
        }

        /// HTTP connection manager network filter configuration.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct HttpConnectionManager {
            #[prost(string, tag = "2")]
            pub stat_prefix: String,
            /// Route configuration fetched over RDS.
            #[prost(message, optional, tag = "3")]
            pub rds: Option<Rds>,
            /// Inline route configuration.
            #[prost(message, optional, tag = "4")]
            pub route_config: Option<RouteConfiguration>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Rds {
            #[prost(message, optional, tag = "1")]
            pub config_source: Option<ConfigSource>,
            #[prost(string, tag = "2")]
            pub route_config_name: String,
        }

        /// Route configuration.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct RouteConfiguration {
            /// Route config name.
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(message, repeated, tag = "2")]
            pub virtual_hosts: Vec<VirtualHost>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct VirtualHost {
            #[prost(string, tag = "1")]
            pub name: String,
            #[prost(string, repeated, tag = "2")]
            pub domains: Vec<String>,
            #[prost(message, repeated, tag = "3")]
            pub routes: Vec<Route>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Route {
            #[prost(message, optional, tag = "1")]
            pub r#match: Option<RouteMatch>,
            #[prost(message, optional, tag = "2")]
            pub route: Option<RouteAction>,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct RouteMatch {
            #[prost(string, tag = "1")]
            pub prefix: String,
        }

        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct RouteAction {
            #[prost(string, tag = "1")]
            pub cluster: String,
        }

        /// TLS secret.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Secret {
            #[prost(string, tag = "1")]
            pub name: String,
        }
    };
}

pub mod v2 {
    //! `envoy.api.v2` messages.

    xds_messages!();
}

pub mod v3 {
    //! v3 messages.

    xds_messages!();
}

pub mod google {
    //! Google API types.

    pub mod rpc {
        //! gRPC status types.

        /// Status type for error responses.
        #[derive(Clone, PartialEq, ::prost::Message)]
        pub struct Status {
            /// Status code.
            #[prost(int32, tag = "1")]
            pub code: i32,
            /// Status message.
            #[prost(string, tag = "2")]
            pub message: String,
            /// Details.
            #[prost(message, repeated, tag = "3")]
            pub details: Vec<prost_types::Any>,
        }
    }
}

/// Type URL constants.
pub mod type_url {
    /// v3 Cluster type URL.
    pub const CLUSTER: &str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";
    /// v3 Listener type URL.
    pub const LISTENER: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";
    /// v3 Route type URL.
    pub const ROUTE: &str = "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";
    /// v3 Endpoint type URL.
    pub const ENDPOINT: &str = "type.googleapis.com/envoy.config.endpoint.v3.ClusterLoadAssignment";
    /// v3 Secret type URL.
    pub const SECRET: &str = "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.Secret";
    /// v3 HTTP connection manager filter config type URL.
    pub const HTTP_CONNECTION_MANAGER: &str = "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";

    /// v2 Cluster type URL.
    pub const V2_CLUSTER: &str = "type.googleapis.com/envoy.api.v2.Cluster";
    /// v2 Listener type URL.
    pub const V2_LISTENER: &str = "type.googleapis.com/envoy.api.v2.Listener";
    /// v2 Route type URL.
    pub const V2_ROUTE: &str = "type.googleapis.com/envoy.api.v2.RouteConfiguration";
    /// v2 Endpoint type URL.
    pub const V2_ENDPOINT: &str = "type.googleapis.com/envoy.api.v2.ClusterLoadAssignment";
    /// v2 Secret type URL.
    pub const V2_SECRET: &str = "type.googleapis.com/envoy.api.v2.auth.Secret";
    /// v2 HTTP connection manager filter config type URL.
    pub const V2_HTTP_CONNECTION_MANAGER: &str = "type.googleapis.com/envoy.config.filter.network.http_connection_manager.v2.HttpConnectionManager";
}
