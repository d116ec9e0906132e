//! Presence Integration Tests
//!
//! Runs several nodes in one process against a shared in-memory store and
//! change bus. Time is paused; the status clock is driven by hand.
//!
//! Run with: cargo test -p presence-integration-tests --test presence_tests

use std::time::Duration;

use chrono::TimeDelta;
use presence_core::{ChangeEvent, ChangePublisher, USERS_STATUS_COLLECTION};
use presence_integration_tests::{fixtures::*, settle, TestCluster};
use presence_service::{SubscriptionState, WriteOutcome};

// ============================================================================
// Activity Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_activity_marks_online_and_goes_stale() {
    let cluster = TestCluster::new();
    let node = cluster.node(test_settings()).unwrap();
    let u1 = unique_subject();

    node.set_actor(Some(u1.clone()));
    node.mark_active();
    assert!(cluster.store.get(&u1).is_none());

    tokio::time::sleep(WINDOW + Duration::from_millis(10)).await;
    let record = cluster.store.get(&u1).expect("record written after the window");
    assert!(record.online);
    assert_eq!(record.last_activity_at, Some(t0()));

    cluster.clock.set(t0() + TimeDelta::minutes(3));
    assert!(node.check_status(&u1).await);

    cluster.clock.set(t0() + TimeDelta::minutes(10));
    assert!(!node.check_status(&u1).await);
    assert_eq!(node.cached_status(&u1), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_activity_burst_writes_once() {
    let cluster = TestCluster::new();
    let node = cluster.node(test_settings()).unwrap();
    node.set_actor(Some(unique_subject()));

    for _ in 0..10 {
        node.mark_active();
        tokio::time::sleep(WINDOW / 4).await;
    }
    tokio::time::sleep(WINDOW * 2).await;

    assert_eq!(cluster.store.write_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_write_dropped_while_in_flight() {
    let cluster = TestCluster::new();
    cluster.store.set_latency(Duration::from_millis(200));
    let node = std::sync::Arc::new(cluster.node(test_settings()).unwrap());
    let u1 = unique_subject();
    node.set_actor(Some(u1.clone()));

    let first = tokio::spawn({
        let node = node.clone();
        async move { node.set_status(true).await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(node.set_status(false).await, Some(WriteOutcome::Dropped));
    assert_eq!(first.await.unwrap(), Some(WriteOutcome::Created));
    assert!(cluster.store.get(&u1).unwrap().online);
}

#[tokio::test(start_paused = true)]
async fn test_store_outage_reads_offline_without_caching() {
    let cluster = TestCluster::new();
    let node = cluster.node(test_settings()).unwrap();
    let u1 = unique_subject();
    cluster.store.insert(status_record(&u1, true, t0()));

    cluster.store.set_unavailable(true);
    assert!(!node.check_status(&u1).await);
    assert_eq!(node.cached_status(&u1), None);

    node.set_actor(Some(u1.clone()));
    assert_eq!(node.set_status(false).await, Some(WriteOutcome::Failed));

    cluster.store.set_unavailable(false);
    assert!(node.check_status(&u1).await);
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_change_on_one_node_reaches_another() {
    let cluster = TestCluster::new();
    let writer = cluster.node(stream_only_settings()).unwrap();
    let watcher = cluster.node(stream_only_settings()).unwrap();
    let u1 = unique_subject();

    let handle = watcher.subscribe(u1.clone()).await;
    assert_eq!(handle.state(), SubscriptionState::Active);

    writer.set_actor(Some(u1.clone()));
    writer.set_status(true).await;
    settle().await;
    assert_eq!(watcher.cached_status(&u1), Some(true));

    writer.set_status(false).await;
    settle().await;
    assert_eq!(watcher.cached_status(&u1), Some(false));

    // The writing node never evaluated anything itself
    assert_eq!(writer.cached_status(&u1), None);
    handle.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_poll_detects_staleness_without_changes() {
    let cluster = TestCluster::new();
    let watcher = cluster.node(test_settings()).unwrap();
    let u1 = unique_subject();
    cluster.store.insert(status_record(&u1, true, t0()));

    let _handle = watcher.subscribe(u1.clone()).await;

    // No evaluation before the first full interval
    tokio::time::sleep(POLL - Duration::from_millis(100)).await;
    assert_eq!(watcher.cached_status(&u1), None);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(watcher.cached_status(&u1), Some(true));

    cluster.clock.advance(TimeDelta::minutes(8));
    tokio::time::sleep(POLL).await;
    assert_eq!(watcher.cached_status(&u1), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_missing_record_cached_offline() {
    let cluster = TestCluster::new();
    let watcher = cluster.node(test_settings()).unwrap();
    let ghost = unique_subject();

    let _handle = watcher.subscribe(ghost.clone()).await;
    tokio::time::sleep(POLL + Duration::from_millis(10)).await;

    assert_eq!(watcher.cached_status(&ghost), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_deleted_event_does_not_evaluate() {
    let cluster = TestCluster::new();
    let watcher = cluster.node(stream_only_settings()).unwrap();
    let u1 = unique_subject();

    let _handle = watcher.subscribe(u1.clone()).await;
    cluster
        .bus
        .publish(
            USERS_STATUS_COLLECTION,
            &ChangeEvent::deleted(status_record(&u1, true, t0())),
        )
        .await
        .unwrap();
    settle().await;

    assert_eq!(watcher.cache().write_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_subscription_never_writes_cache() {
    let cluster = TestCluster::new();
    let writer = cluster.node(test_settings()).unwrap();
    let watcher = cluster.node(test_settings()).unwrap();
    let u1 = unique_subject();

    let handle = watcher.subscribe(u1.clone()).await;
    handle.cancel();

    writer.set_actor(Some(u1.clone()));
    writer.set_status(true).await;
    tokio::time::sleep(POLL * 3).await;

    assert_eq!(watcher.cache().write_count(), 0);
    assert_eq!(watcher.active_subscriptions(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_failure_returns_inert_handle() {
    let cluster = TestCluster::new();
    cluster.bus.set_unavailable(true);
    let watcher = cluster.node(test_settings()).unwrap();
    let u1 = unique_subject();
    cluster.store.insert(status_record(&u1, true, t0()));

    let handle = watcher.subscribe(u1.clone()).await;
    assert!(handle.is_noop());
    assert_eq!(watcher.active_subscriptions(), 0);

    // No poll was started either
    tokio::time::sleep(POLL * 2).await;
    assert_eq!(watcher.cached_status(&u1), None);

    handle.cancel();
}

// ============================================================================
// Teardown Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cleanup_all_stops_everything() {
    let cluster = TestCluster::new();
    let node = cluster.node(test_settings()).unwrap();
    let other = cluster.node(test_settings()).unwrap();
    let u1 = unique_subject();
    let u2 = unique_subject();

    node.set_actor(Some(u1.clone()));
    let h1 = node.subscribe(u1.clone()).await;
    let h2 = node.subscribe(u2.clone()).await;
    assert_eq!(node.watched_subjects().len(), 2);

    node.mark_active();
    node.cleanup_all();

    assert_eq!(h1.state(), SubscriptionState::Cancelled);
    assert_eq!(h2.state(), SubscriptionState::Cancelled);
    assert_eq!(node.active_subscriptions(), 0);

    other.set_actor(Some(u2.clone()));
    other.set_status(true).await;
    tokio::time::sleep(POLL * 2).await;

    // Only `other`'s write reached the store; nothing reached node's cache
    assert_eq!(cluster.store.write_count(), 1);
    assert!(cluster.store.get(&u1).is_none());
    assert_eq!(node.cache().write_count(), 0);

    // Cancelling after cleanup is harmless
    h1.cancel();
    h2.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_workers() {
    let cluster = TestCluster::new();
    let node = cluster.node(test_settings()).unwrap();

    for _ in 0..3 {
        let _ = node.subscribe(unique_subject()).await;
    }
    assert_eq!(cluster.bus.subscriber_count(), 3);

    node.shutdown().await;
    settle().await;

    assert_eq!(node.active_subscriptions(), 0);
    assert_eq!(cluster.bus.subscriber_count(), 0);
}
