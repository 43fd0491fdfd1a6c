//! Load tests for the snapshot cache with 1000+ groups.
//!
//! These tests verify the cache under load:
//! - 1000+ groups with full, consistent snapshots
//! - Parallel snapshot updates racing watch creation
//! - Every watch resolves at most once
//!
//! Run with: `cargo test --package integration-tests --test load_tests -- --nocapture`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use integration_tests::{consistent_snapshot, init_tracing, request};
use tokio::sync::Barrier;
use xds_snapcache::prelude::*;

/// Test that the cache can handle 1000 groups.
#[tokio::test]
async fn test_1000_groups() {
    init_tracing();
    let cache = Arc::new(ShardedCache::new());
    let num_nodes = 1000;

    let nodes: Vec<NodeHash> = (0..num_nodes)
        .map(|i| NodeHash::from_id(&format!("envoy-sidecar-{}", i)))
        .collect();

    let start = Instant::now();
    for (i, node) in nodes.iter().enumerate() {
        cache
            .set_snapshot(*node, consistent_snapshot(&format!("v{}", i)))
            .unwrap();
    }
    let set_duration = start.elapsed();
    println!(
        "Set {} snapshots in {:?} ({:.2} µs/op)",
        num_nodes,
        set_duration,
        set_duration.as_micros() as f64 / num_nodes as f64
    );

    let start = Instant::now();
    for node in &nodes {
        assert!(cache.get_snapshot(node).is_some());
    }
    let get_duration = start.elapsed();
    println!(
        "Got {} snapshots in {:?} ({:.2} µs/op)",
        num_nodes,
        get_duration,
        get_duration.as_micros() as f64 / num_nodes as f64
    );

    assert_eq!(cache.group_count(), num_nodes);
    assert_eq!(cache.stats().snapshots_set(), num_nodes as u64);
}

/// Parallel producers publishing to disjoint groups.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_updates() {
    init_tracing();
    let cache = Arc::new(ShardedCache::new());
    let num_tasks = 10;
    let nodes_per_task = 100;
    let barrier = Arc::new(Barrier::new(num_tasks));

    let start = Instant::now();
    let handles: Vec<_> = (0..num_tasks)
        .map(|task_id| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                for i in 0..nodes_per_task {
                    let node = NodeHash::from_id(&format!("task-{}-node-{}", task_id, i));
                    cache
                        .set_snapshot(node, consistent_snapshot(&format!("v{}", i)))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    let duration = start.elapsed();
    println!(
        "{} parallel tasks set {} snapshots in {:?}",
        num_tasks,
        num_tasks * nodes_per_task,
        duration
    );

    assert_eq!(cache.group_count(), num_tasks * nodes_per_task);
}

/// Watches on 1000 groups all resolve once a snapshot lands.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watch_notification_under_load() {
    init_tracing();
    let cache = Arc::new(ShardedCache::new());
    let num_nodes = 1000;
    let resolved = Arc::new(AtomicU64::new(0));

    let watches: Vec<_> = (0..num_nodes)
        .map(|i| {
            let counter = Arc::clone(&resolved);
            cache
                .create_watch(
                    true,
                    request(&format!("node-{}", i), TypeUrl::CLUSTER, "", &[]),
                    Box::new(move |_| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        Ok(())
                    }),
                )
                .unwrap()
        })
        .collect();
    assert!(watches.iter().all(|w| w.is_pending()));

    let start = Instant::now();
    let handles: Vec<_> = (0..4)
        .map(|shard| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for i in (shard..num_nodes).step_by(4) {
                    let node = NodeHash::from_id(&format!("node-{}", i));
                    cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    println!("Resolved {} watches in {:?}", num_nodes, start.elapsed());

    assert_eq!(resolved.load(Ordering::Relaxed), num_nodes as u64);
    assert!(watches.iter().all(|w| w.is_resolved()));
    assert_eq!(cache.stats().responses_sent(), num_nodes as u64);
}

/// Watch creation racing snapshot updates on one group never double
/// delivers and never loses a watch whose version differs.
#[test]
fn test_watch_snapshot_race() {
    init_tracing();
    let cache = Arc::new(ShardedCache::new());
    let node = NodeHash::from_id("contended");
    let num_watches = 500;
    let delivered = Arc::new(AtomicU64::new(0));

    let producer = {
        let cache = Arc::clone(&cache);
        std::thread::spawn(move || {
            for v in 0..200 {
                cache
                    .set_snapshot(node, consistent_snapshot(&format!("v{}", v)))
                    .unwrap();
            }
        })
    };

    let watches: Vec<_> = (0..num_watches)
        .map(|_| {
            let counter = Arc::clone(&delivered);
            cache
                .create_watch(
                    false,
                    request("contended", TypeUrl::LISTENER, "stale", &[]),
                    Box::new(move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )
                .unwrap()
        })
        .collect();

    producer.join().unwrap();
    // Any watch parked before the first snapshot resolves on the next one
    cache.set_snapshot(node, consistent_snapshot("final")).unwrap();

    assert_eq!(delivered.load(Ordering::SeqCst), num_watches as u64);
    assert!(watches.iter().all(|w| w.is_resolved()));
    assert_eq!(
        cache.status_info(&node).map(|s| s.num_watches()),
        Some(0)
    );
}

/// Cancelling half the watches under load leaves the rest deliverable.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_under_load() {
    let cache = Arc::new(ShardedCache::new());
    let num_nodes = 1000;

    let mut receivers = Vec::with_capacity(num_nodes);
    for i in 0..num_nodes {
        let (watch, rx) = cache
            .watch_channel(false, request(&format!("node-{}", i), TypeUrl::ROUTE, "", &[]))
            .unwrap();
        if i % 2 == 0 {
            assert!(watch.cancel());
        } else {
            receivers.push(rx);
        }
    }

    for i in 0..num_nodes {
        let node = NodeHash::from_id(&format!("node-{}", i));
        cache.set_snapshot(node, consistent_snapshot("v1")).unwrap();
        assert_eq!(cache.status_info(&node).unwrap().num_watches(), 0);
    }

    let start = Instant::now();
    for rx in receivers {
        let response = tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("watch should resolve")
            .unwrap();
        assert_eq!(response.version(), "v1");
    }
    println!("Drained {} responses in {:?}", num_nodes / 2, start.elapsed());

    assert_eq!(cache.stats().responses_sent(), (num_nodes / 2) as u64);
}
