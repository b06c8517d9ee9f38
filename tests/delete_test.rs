//! Integration tests for fan-out job deletion.

mod common;

use bullmq_explorer::model::{DeleteOutcome, JobFilter, Status};
use common::{emails_store, explorer, key, queue, seed_job};

#[tokio::test]
async fn removes_from_every_collection() {
    let store = emails_store().await;
    store.push_list(&key("emails", "active"), ["7"]).await;
    store.add_sorted(&key("emails", "delayed"), 1_700_000_000_000.0, "7").await;
    seed_job(&store, "emails", "7", "retry", r#"{"to":"x@example.com"}"#).await;
    let explorer = explorer(&store);
    let q = queue("emails");

    let outcome = explorer.delete(&q, "7").await.unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            removed_from: vec![Status::Active, Status::Delayed],
            record_removed: true,
        }
    );

    let counts = explorer.counts_by_status(&q).await.unwrap();
    assert_eq!(counts.get(Status::Active), 0);
    assert_eq!(counts.get(Status::Delayed), 0);
    assert!(explorer.statuses_of(&q, "7").await.unwrap().is_empty());
    assert!(explorer.load(&q, "7").await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_twice_is_harmless() {
    let store = emails_store().await;
    let explorer = explorer(&store);
    let q = queue("emails");

    assert!(explorer.delete(&q, "2").await.unwrap().is_deleted());
    assert_eq!(
        explorer.delete(&q, "2").await.unwrap(),
        DeleteOutcome::NotFoundAnywhere
    );

    let page = explorer
        .list_jobs(&q, &JobFilter::new().status(Status::Waiting))
        .await
        .unwrap();
    let ids: Vec<_> = page.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[tokio::test]
async fn removes_job_logs() {
    let store = emails_store().await;
    let logs = key("emails", "4:logs");
    store.push_list(&logs, ["attempt 1 failed", "giving up"]).await;

    explorer(&store).delete(&queue("emails"), "4").await.unwrap();
    assert!(!store.exists(&logs).await);
    assert!(!store.exists(&key("emails", "4")).await);
}

#[tokio::test]
async fn orphaned_logs_alone_are_not_a_deletion() {
    let store = emails_store().await;
    let logs = key("emails", "99:logs");
    store.push_list(&logs, ["stale"]).await;

    let outcome = explorer(&store).delete(&queue("emails"), "99").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::NotFoundAnywhere);
    assert!(!store.exists(&logs).await);
}

#[tokio::test]
async fn record_without_membership_is_still_deleted() {
    let store = emails_store().await;
    seed_job(&store, "emails", "50", "orphan", "{}").await;

    let outcome = explorer(&store).delete(&queue("emails"), "50").await.unwrap();
    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            removed_from: vec![],
            record_removed: true,
        }
    );
}

#[tokio::test]
async fn other_jobs_are_untouched() {
    let store = emails_store().await;
    let explorer = explorer(&store);
    let q = queue("emails");

    store.set_string(&key("emails", "id"), "4").await;

    explorer.delete(&q, "4").await.unwrap();
    assert_eq!(store.get_string(&key("emails", "id")).await.as_deref(), Some("4"));
    let counts = explorer.counts_by_status(&q).await.unwrap();
    assert_eq!(counts.get(Status::Waiting), 3);
    assert_eq!(counts.get(Status::Failed), 0);
    assert!(store.exists(&key("emails", "meta")).await);
}

#[tokio::test]
async fn unreachable_store_is_connection_error() {
    let store = emails_store().await;
    store.set_offline(true);
    let err = explorer(&store)
        .delete(&queue("emails"), "1")
        .await
        .unwrap_err();
    assert!(err.is_connection());
}
