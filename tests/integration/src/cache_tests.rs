//! Cache integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use integration_tests::{consistent_snapshot, init_tracing, request, rds_listener, route};
use xds_snapcache::prelude::*;
use xds_snapcache::types::v2;

fn counting_callback(counter: &Arc<AtomicUsize>) -> xds_snapcache::cache::ResponseCallback {
    let counter = Arc::clone(counter);
    Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[test]
fn cache_basic_operations() {
    init_tracing();
    let cache = ShardedCache::new();
    let node = NodeHash::from_id("test-node");

    cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();

    let retrieved = cache.get_snapshot(&node).expect("snapshot should exist");
    assert_eq!(retrieved.version(), "v1");
    assert!(retrieved.contains_type(TypeUrl::CLUSTER));
    assert_eq!(cache.groups(), vec![node]);
}

#[test]
fn cache_multiple_nodes() {
    let cache = ShardedCache::new();

    let nodes = ["node-1", "node-2", "node-3"];
    for (i, node_id) in nodes.iter().enumerate() {
        let snapshot = consistent_snapshot(&format!("v{}", i + 1));
        cache.set_snapshot(NodeHash::from_id(node_id), snapshot).unwrap();
    }

    assert_eq!(cache.group_count(), 3);

    for (i, node_id) in nodes.iter().enumerate() {
        let snapshot = cache.get_snapshot(&NodeHash::from_id(node_id)).unwrap();
        assert_eq!(snapshot.version(), format!("v{}", i + 1));
    }
}

#[tokio::test]
async fn long_poll_cycle() {
    init_tracing();
    let cache = ShardedCache::new();
    let node = NodeHash::from_id("envoy-1");

    // First request: nothing published yet
    let (watch, rx) = cache
        .watch_channel(true, request("envoy-1", TypeUrl::LISTENER, "", &[]))
        .unwrap();
    assert!(watch.is_pending());

    cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();
    let response = rx.await.unwrap();
    assert_eq!(response.version(), "v1");
    assert_eq!(response.resources()[0].name(), "listener0");

    // ACK: subscriber now holds v1 and waits again
    let (ack, mut rx) = cache
        .watch_channel(true, request("envoy-1", TypeUrl::LISTENER, "v1", &[]))
        .unwrap();
    assert!(ack.is_pending());

    cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();
    assert!(rx.try_recv().is_err());
    assert!(ack.is_pending());

    cache.set_snapshot(node, consistent_snapshot("v2")).unwrap();
    let response = tokio::time::timeout(Duration::from_secs(1), rx)
        .await
        .expect("watch should resolve")
        .unwrap();
    assert_eq!(response.version(), "v2");
    let packed = response.encode_resources().unwrap();
    assert_eq!(packed[0].type_url, TypeUrl::LISTENER);
}

#[test]
fn watch_resolves_once_across_many_snapshots() {
    let cache = ShardedCache::new();
    let node = NodeHash::from_id("n1");
    let calls = Arc::new(AtomicUsize::new(0));

    let watch = cache
        .create_watch(
            false,
            request("n1", TypeUrl::CLUSTER, "v0", &[]),
            counting_callback(&calls),
        )
        .unwrap();

    cache.set_snapshot(node, consistent_snapshot("v0")).unwrap();
    assert!(watch.is_pending());

    for v in 1..5 {
        cache.set_snapshot(node, consistent_snapshot(&format!("v{v}"))).unwrap();
    }

    assert!(watch.is_resolved());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn named_requests_only_get_their_resources() {
    let cache = ShardedCache::new();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);

    cache
        .create_watch(
            false,
            request("n1", TypeUrl::ROUTE, "", &["route1"]),
            Box::new(move |response| {
                sink.lock().unwrap().push(response);
                Ok(())
            }),
        )
        .unwrap();

    let snapshot = Snapshot::builder()
        .version("v1")
        .resources(
            TypeUrl::LISTENER,
            vec![rds_listener("l0", "route0"), rds_listener("l1", "route1")],
        )
        .resources(
            TypeUrl::ROUTE,
            vec![route("route0", "c0"), route("route1", "c1")],
        )
        .build();
    snapshot.ensure_consistent().unwrap();
    cache.set_snapshot(NodeHash::from_id("n1"), snapshot).unwrap();

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let names: Vec<&str> = received[0].resources().iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["route1"]);
}

#[test]
fn cancelled_watch_stays_silent() {
    let cache = ShardedCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let watch = cache
        .create_watch(
            false,
            request("n1", TypeUrl::CLUSTER, "", &[]),
            counting_callback(&calls),
        )
        .unwrap();

    assert!(watch.cancel());
    assert!(!watch.cancel());
    cache
        .set_snapshot(NodeHash::from_id("n1"), consistent_snapshot("v1"))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(watch.state(), WatchState::Cancelled);
}

#[test]
fn legacy_and_current_generations_do_not_mix() {
    let cache = ShardedCache::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let legacy = XdsRequest::from(v2::DiscoveryRequest {
        node: Some(v2::Node {
            id: "n1".to_string(),
            ..Default::default()
        }),
        type_url: TypeUrl::V2_CLUSTER.to_string(),
        version_info: "v0".to_string(),
        ..Default::default()
    });
    let watch = cache
        .create_watch(false, legacy, counting_callback(&calls))
        .unwrap();

    cache
        .set_snapshot(NodeHash::from_id("n1"), consistent_snapshot("v1"))
        .unwrap();

    // v1 carries no v2 clusters, so the legacy version reads as empty
    assert!(watch.is_resolved());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn cluster_grouping_shares_snapshots() {
    let cache = CacheBuilder::new()
        .node_group(NodeClusterGroup)
        .build();
    let calls = Arc::new(AtomicUsize::new(0));

    for id in ["envoy-a", "envoy-b", "envoy-c"] {
        cache
            .create_watch(
                false,
                request(id, TypeUrl::CLUSTER, "", &[]),
                counting_callback(&calls),
            )
            .unwrap();
    }
    assert_eq!(cache.group_count(), 1);

    cache
        .set_snapshot("test-cluster".to_string(), consistent_snapshot("v1"))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let status = cache.status_info(&"test-cluster".to_string()).unwrap();
    assert_eq!(status.node().map(XdsNode::id), Some("envoy-c"));
    assert_eq!(status.num_watches(), 0);
}

#[test]
fn cache_clear_snapshot() {
    let cache = ShardedCache::new();
    let node = NodeHash::from_id("test-node");

    cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();
    assert!(cache.get_snapshot(&node).is_some());

    assert!(cache.clear_snapshot(&node));
    assert!(cache.get_snapshot(&node).is_none());
    assert!(!cache.clear_snapshot(&node));
}

#[test]
fn cache_stats_tracking() {
    let cache = ShardedCache::new();
    let node = NodeHash::from_id("test-node");

    cache.get_snapshot(&node);
    assert_eq!(cache.stats().snapshot_misses(), 1);

    cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();
    assert_eq!(cache.stats().snapshots_set(), 1);

    cache.get_snapshot(&node);
    assert_eq!(cache.stats().snapshot_hits(), 1);

    let (_watch, _rx) = cache
        .watch_channel(false, request("test-node", TypeUrl::CLUSTER, "", &[]))
        .unwrap();
    assert_eq!(cache.stats().responses_sent(), 1);
}

#[tokio::test]
async fn reclaimer_collects_idle_groups() {
    init_tracing();
    let cache = Arc::new(ShardedCache::new());
    let evictions = Arc::new(AtomicUsize::new(0));

    // An idle group and a group with an open long poll
    cache
        .watch_channel(false, request("idle", TypeUrl::CLUSTER, "", &[]))
        .unwrap()
        .0
        .cancel();
    let (_busy, _rx) = cache
        .watch_channel(false, request("busy", TypeUrl::CLUSTER, "", &[]))
        .unwrap();

    let counter = Arc::clone(&evictions);
    let reclaimer = GroupReclaimer::new(
        Arc::clone(&cache),
        ReclaimConfig::default()
            .with_interval(Duration::from_millis(10))
            .with_collect_after(Duration::from_millis(20)),
    )
    .unwrap()
    .on_evict(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = reclaimer.spawn(shutdown_rx);

    tokio::time::timeout(Duration::from_secs(5), async {
        while cache.group_count() > 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("idle group should be reclaimed");

    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(evictions.load(Ordering::SeqCst), 1);
    assert_eq!(cache.groups(), vec![NodeHash::from_id("busy")]);
}
