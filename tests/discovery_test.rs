//! Integration tests for queue discovery.

mod common;

use bullmq_explorer::error::Error;
use bullmq_explorer::store::MemoryStore;
use common::{explorer, key};

fn names(queues: &[bullmq_explorer::model::Queue]) -> Vec<&str> {
    queues.iter().map(|q| q.name.as_str()).collect()
}

#[tokio::test]
async fn discovers_queues_from_status_keys() {
    let store = MemoryStore::new();
    store.push_list(&key("emails", "wait"), ["1"]).await;
    store.push_list(&key("sms", "active"), ["9"]).await;

    let queues = explorer(&store).discover("bull").await.unwrap();
    assert_eq!(names(&queues), vec!["emails", "sms"]);
    assert!(queues.iter().all(|q| q.prefix == "bull"));
}

#[tokio::test]
async fn long_form_waiting_key_is_recognized() {
    let store = MemoryStore::new();
    store.push_list("bull:emails:waiting", ["1"]).await;
    store.push_list("bull:sms:active", ["2"]).await;

    let queues = explorer(&store).discover("bull").await.unwrap();
    assert_eq!(names(&queues), vec!["emails", "sms"]);
}

#[tokio::test]
async fn deduplicates_and_sorts() {
    let store = common::emails_store().await;
    store.add_sorted(&key("billing", "completed"), 5.0, "77").await;
    store.set_hash(&key("billing", "meta"), [("paused", "0")]).await;

    let queues = explorer(&store).discover("bull").await.unwrap();
    assert_eq!(names(&queues), vec!["billing", "emails"]);
}

#[tokio::test]
async fn ignores_auxiliary_keys() {
    let store = MemoryStore::new();
    store.set_string(&key("ghost", "id"), "12").await;
    store.set_string(&key("ghost", "stalled-check"), "1").await;
    store.set_string("bull:ghost:12:lock", "token").await;
    store.set_hash(&key("ghost", "12"), [("name", "orphan")]).await;
    store.push_list(&key("real", "paused"), ["1"]).await;

    let queues = explorer(&store).discover("bull").await.unwrap();
    assert_eq!(names(&queues), vec!["real"]);
}

#[tokio::test]
async fn other_prefixes_are_not_mixed_in() {
    let store = MemoryStore::new();
    store.push_list("bull:emails:wait", ["1"]).await;
    store.push_list("bullish:stocks:wait", ["1"]).await;
    store.push_list("other:sms:wait", ["1"]).await;

    let queues = explorer(&store).discover("bull").await.unwrap();
    assert_eq!(names(&queues), vec!["emails"]);
}

#[tokio::test]
async fn hash_tagged_prefix_matches_literally() {
    let store = MemoryStore::new();
    store.push_list("{bull}:emails:wait", ["1"]).await;
    store.push_list("b:emails:wait", ["1"]).await;

    let queues = explorer(&store).discover("{bull}").await.unwrap();
    assert_eq!(names(&queues), vec!["emails"]);
    assert_eq!(queues[0].prefix, "{bull}");
}

#[tokio::test]
async fn unknown_prefix_yields_empty_list() {
    let store = common::emails_store().await;
    let queues = explorer(&store).discover("nothing-here").await.unwrap();
    assert!(queues.is_empty());
}

#[tokio::test]
async fn empty_prefix_is_invalid() {
    let store = MemoryStore::new();
    let err = explorer(&store).discover("  ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[tokio::test]
async fn unreachable_store_is_connection_error() {
    let store = common::emails_store().await;
    store.set_offline(true);
    let err = explorer(&store).discover("bull").await.unwrap_err();
    assert!(err.is_connection(), "expected connection error, got {err:?}");
}
