//! Integration tests for the auto-refresh loop.

mod common;

use bullmq_explorer::engine::AutoRefresh;
use bullmq_explorer::model::{JobFilter, Status};
use common::{emails_store, explorer, key, queue};
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn first_snapshot_arrives_immediately() {
    let store = emails_store().await;
    store.set_info("redis_version:7.2.4\r\n").await;

    let (handle, mut rx) = AutoRefresh::new(explorer(&store), queue("emails"), JobFilter::new())
        .interval(Duration::from_secs(3600))
        .spawn();

    let snapshot = timeout(WAIT, rx.recv()).await.unwrap().unwrap().unwrap();
    assert_eq!(snapshot.counts.get(Status::Waiting), 3);
    assert_eq!(snapshot.page.total_matching, 4);
    assert_eq!(snapshot.health.version_display(), "7.2.4");

    handle.stop().await;
}

#[tokio::test]
async fn refresh_now_picks_up_changes() {
    let store = emails_store().await;
    let (handle, mut rx) = AutoRefresh::new(
        explorer(&store),
        queue("emails"),
        JobFilter::new().status(Status::Active),
    )
    .interval(Duration::from_secs(3600))
    .spawn();

    let first = timeout(WAIT, rx.recv()).await.unwrap().unwrap().unwrap();
    assert_eq!(first.page.total_matching, 0);

    store.push_list(&key("emails", "active"), ["1"]).await;
    handle.refresh_now();

    let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap().unwrap();
    assert_eq!(second.page.total_matching, 1);
    assert_eq!(second.counts.get(Status::Active), 1);

    handle.stop().await;
}

#[tokio::test]
async fn failures_are_delivered_and_loop_keeps_running() {
    let store = emails_store().await;
    store.set_offline(true);
    let (handle, mut rx) = AutoRefresh::new(explorer(&store), queue("emails"), JobFilter::new())
        .interval(Duration::from_secs(3600))
        .spawn();

    let err = timeout(WAIT, rx.recv()).await.unwrap().unwrap().unwrap_err();
    assert!(err.is_connection());

    store.set_offline(false);
    handle.refresh_now();
    let snapshot = timeout(WAIT, rx.recv()).await.unwrap().unwrap().unwrap();
    assert_eq!(snapshot.counts.total(), 4);

    handle.stop().await;
}

#[tokio::test]
async fn stop_closes_the_channel() {
    let store = emails_store().await;
    let (handle, mut rx) = AutoRefresh::new(explorer(&store), queue("emails"), JobFilter::new())
        .interval(Duration::from_millis(20))
        .spawn();

    timeout(WAIT, rx.recv()).await.unwrap().unwrap().unwrap();
    handle.stop().await;

    // Drain whatever was already queued; the sender side is gone afterwards.
    while let Some(next) = timeout(WAIT, rx.recv()).await.unwrap() {
        assert!(next.is_ok());
    }
}
