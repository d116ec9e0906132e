//! Live Backend Tests
//!
//! These tests require:
//! - Running PostgreSQL instance
//! - Running Redis instance
//! - Environment variables: DATABASE_URL, REDIS_URL
//!
//! Run with: cargo test -p presence-integration-tests --test live_tests

use std::time::Duration;

use presence_agent::create_service;
use presence_integration_tests::{check_test_env, fixtures::unique_subject, test_config, wait_for};
use presence_service::WriteOutcome;

#[tokio::test]
async fn test_status_round_trip_through_postgres() {
    if !check_test_env() {
        return;
    }

    let config = test_config().expect("Failed to load config");
    let node = create_service(&config).await.expect("Failed to start node");
    let subject_id = unique_subject();

    assert!(!node.check_status(&subject_id).await);

    node.set_actor(Some(subject_id.clone()));
    assert_eq!(node.set_status(true).await, Some(WriteOutcome::Created));
    assert!(node.check_status(&subject_id).await);

    assert_eq!(node.set_status(false).await, Some(WriteOutcome::Updated));
    assert!(!node.check_status(&subject_id).await);

    node.shutdown().await;
}

#[tokio::test]
async fn test_change_notification_through_redis() {
    if !check_test_env() {
        return;
    }

    let config = test_config().expect("Failed to load config");
    let writer = create_service(&config).await.expect("Failed to start writer");
    let watcher = create_service(&config).await.expect("Failed to start watcher");
    let subject_id = unique_subject();

    let handle = watcher.subscribe(subject_id.clone()).await;
    assert!(!handle.is_noop());

    writer.set_actor(Some(subject_id.clone()));
    writer.set_status(true).await;

    let seen = wait_for(Duration::from_secs(5), || {
        watcher.cached_status(&subject_id) == Some(true)
    })
    .await;
    assert!(seen, "watcher never saw the status change");

    handle.cancel();
    writer.shutdown().await;
    watcher.shutdown().await;
}
