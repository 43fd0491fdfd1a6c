//! Snapshot and consistency integration tests.

use integration_tests::{
    consistent_snapshot, dns_cluster, eds_cluster, endpoint, init_tracing, rds_listener, request,
    route,
};
use xds_snapcache::cache::resources::{resource_references, unpack};
use xds_snapcache::core::envoy::pack;
use xds_snapcache::prelude::*;
use xds_snapcache::types::v3;

fn inconsistency(snapshot: &Snapshot) -> (String, Vec<String>, Vec<String>, String) {
    match snapshot.ensure_consistent() {
        Err(XdsError::InconsistentSnapshot {
            child_type_url,
            references,
            resources,
            reason,
            ..
        }) => (child_type_url, references, resources, reason),
        other => panic!("expected inconsistency, got {other:?}"),
    }
}

#[test]
fn snapshot_builder_pattern() {
    let snapshot = consistent_snapshot("v1");

    assert_eq!(snapshot.version(), "v1");
    assert_eq!(snapshot.total_resources(), 4);
    assert!(!snapshot.is_empty());
    for type_url in [TypeUrl::CLUSTER, TypeUrl::ENDPOINT, TypeUrl::LISTENER, TypeUrl::ROUTE] {
        assert!(snapshot.contains_type(type_url), "missing {type_url}");
    }
    assert!(!snapshot.contains_type(TypeUrl::SECRET));
}

#[test]
fn consistent_snapshot_passes() {
    init_tracing();
    consistent_snapshot("v1").ensure_consistent().unwrap();
    Snapshot::empty("v0").ensure_consistent().unwrap();
}

#[test]
fn missing_endpoint_is_reported() {
    init_tracing();
    let snapshot = Snapshot::builder()
        .version("v1")
        .resources(TypeUrl::CLUSTER, vec![eds_cluster("cluster0", "")])
        .build();

    let (child, references, resources, reason) = inconsistency(&snapshot);
    assert_eq!(child, TypeUrl::ENDPOINT);
    assert_eq!(references, vec!["cluster0".to_string()]);
    assert!(resources.is_empty());
    assert_eq!(reason, "mismatched reference and resource lengths, 1 != 0");
}

#[test]
fn wrong_route_name_is_reported() {
    let snapshot = Snapshot::builder()
        .version("v1")
        .resources(TypeUrl::LISTENER, vec![rds_listener("listener0", "route0")])
        .resources(TypeUrl::ROUTE, vec![route("route1", "cluster0")])
        .build();

    let (child, references, resources, reason) = inconsistency(&snapshot);
    assert_eq!(child, TypeUrl::ROUTE);
    assert_eq!(references, vec!["route0".to_string()]);
    assert_eq!(resources, vec!["route1".to_string()]);
    assert!(reason.contains("'route0'"), "{reason}");
    assert!(reason.contains("not listed"), "{reason}");
}

#[test]
fn unreferenced_endpoint_is_inconsistent() {
    let snapshot = Snapshot::builder()
        .version("v1")
        .resources(TypeUrl::CLUSTER, vec![dns_cluster("cluster0")])
        .resources(TypeUrl::ENDPOINT, vec![endpoint("cluster0", 80)])
        .build();

    let (_, references, resources, _) = inconsistency(&snapshot);
    assert!(references.is_empty());
    assert_eq!(resources, vec!["cluster0".to_string()]);
}

#[test]
fn eds_service_name_overrides_cluster_name() {
    let clusters = [
        eds_cluster("frontend", "frontend-eds"),
        eds_cluster("backend", ""),
        dns_cluster("external"),
    ];
    let mut references: Vec<String> = resource_references(clusters.iter())
        .unwrap()
        .into_iter()
        .collect();
    references.sort();
    assert_eq!(references, vec!["backend", "frontend-eds"]);

    let snapshot = Snapshot::builder()
        .version("v1")
        .resources(TypeUrl::CLUSTER, clusters)
        .resources(
            TypeUrl::ENDPOINT,
            vec![endpoint("frontend-eds", 80), endpoint("backend", 81)],
        )
        .build();
    snapshot.ensure_consistent().unwrap();
}

#[tokio::test]
async fn inconsistent_snapshot_is_never_published() {
    let cache = ShardedCache::new();
    let node = NodeHash::from_id("n1");
    cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();

    let broken = Snapshot::builder()
        .version("v2")
        .resources(TypeUrl::LISTENER, vec![rds_listener("listener0", "missing")])
        .build();
    if broken.ensure_consistent().is_ok() {
        cache.set_snapshot(node, broken).unwrap();
    }

    assert_eq!(cache.get_snapshot(&node).unwrap().version(), "v1");
    let (_watch, rx) = cache
        .watch_channel(false, request("n1", TypeUrl::ROUTE, "", &[]))
        .unwrap();
    let response = rx.await.unwrap();
    assert_eq!(response.version(), "v1");
}

#[test]
fn packed_resources_round_through_registry() {
    let payloads = vec![
        pack(
            TypeUrl::CLUSTER,
            &v3::Cluster {
                name: "cluster0".to_string(),
                discovery_type: v3::DiscoveryType::Eds as i32,
                ..Default::default()
            },
        ),
        pack(
            TypeUrl::CLUSTER,
            &v3::Cluster {
                name: "cluster1".to_string(),
                ..Default::default()
            },
        ),
    ];

    let snapshot = Snapshot::builder()
        .version("v1")
        .packed_resources(TypeUrl::CLUSTER, "c1", &payloads)
        .unwrap()
        .resources(TypeUrl::ENDPOINT, vec![endpoint("cluster0", 80)])
        .build();

    snapshot.ensure_consistent().unwrap();
    assert_eq!(snapshot.resource_version(TypeUrl::CLUSTER, &[]), "c1");
    assert_eq!(snapshot.resource_version(TypeUrl::ENDPOINT, &[]), "v1");
    assert_eq!(snapshot.resources(TypeUrl::CLUSTER).len(), 2);
}

#[test]
fn packed_resources_reject_unknown_tags() {
    let payload = prost_types::Any {
        type_url: "type.googleapis.com/envoy.config.core.v3.Unknown".to_string(),
        value: Vec::new(),
    };

    assert!(unpack(&payload).is_err());
    let result = Snapshot::builder()
        .version("v1")
        .packed_resources(TypeUrl::CLUSTER, "v1", [&payload]);
    assert!(result.is_err());
}

#[test]
fn per_type_versions_drive_resolution() {
    let snapshot = Snapshot::builder()
        .version("global")
        .resources_with_version(TypeUrl::CLUSTER, "clusters-7", vec![dns_cluster("c0")])
        .resources_with_resolver(
            TypeUrl::ROUTE,
            |names: &[String]| format!("routes-{}", names.join("+")),
            vec![route("r0", "c0"), route("r1", "c0")],
        )
        .build();

    assert_eq!(snapshot.version(), "global");
    assert_eq!(snapshot.resource_version(TypeUrl::CLUSTER, &[]), "clusters-7");
    assert_eq!(
        snapshot.resource_version(TypeUrl::ROUTE, &["r1".to_string()]),
        "routes-r1"
    );
    assert!(snapshot.resource_version(TypeUrl::SECRET, &[]).is_empty());
}

#[test]
fn response_encodes_filtered_resources() {
    let cache = ShardedCache::new();
    let snapshot = Snapshot::builder()
        .version("v1")
        .resources(TypeUrl::ROUTE, vec![route("r0", "c0"), route("r1", "c1")])
        .build();
    cache.set_snapshot(NodeHash::from_id("n1"), snapshot).unwrap();

    let (_watch, mut rx) = cache
        .watch_channel(false, request("n1", TypeUrl::ROUTE, "", &["r1", "r9"]))
        .unwrap();
    let response = rx.try_recv().unwrap();

    let packed = response.encode_resources().unwrap();
    assert_eq!(packed.len(), 1);
    assert_eq!(packed[0].type_url, TypeUrl::ROUTE);
    let decoded = unpack(&packed[0]).unwrap();
    assert_eq!(decoded.name(), "r1");
}

#[test]
fn type_url_helpers() {
    assert_eq!(TypeUrl::new(TypeUrl::ENDPOINT).short_name(), "ClusterLoadAssignment");
    assert_eq!(TypeUrl::new(TypeUrl::V2_LISTENER).short_name(), "Listener");
    assert!(TypeUrl::ALL.iter().all(|url| TypeUrl::new(*url).is_valid()));
    assert_ne!(TypeUrl::ROUTE, TypeUrl::V2_ROUTE);

    let version = ResourceVersion::new("v3");
    assert!(version.matches("v3"));
    assert!(!version.matches("v2"));
    assert!(ResourceVersion::empty().matches(""));
}
