//! Shared fixtures: an in-memory keyspace laid out the way BullMQ writes it.

#![allow(dead_code)]

use bullmq_explorer::engine::{Explorer, ExplorerConfig};
use bullmq_explorer::model::Queue;
use bullmq_explorer::store::MemoryStore;

pub const PREFIX: &str = "bull";

pub fn queue(name: &str) -> Queue {
    Queue::new(PREFIX, name)
}

pub fn key(queue: &str, suffix: &str) -> String {
    format!("{PREFIX}:{queue}:{suffix}")
}

pub fn explorer(store: &MemoryStore) -> Explorer<MemoryStore> {
    Explorer::new(store.clone(), ExplorerConfig::default())
}

/// Explorer whose searches fetch `batch` ids per round-trip.
pub fn explorer_with_batch(store: &MemoryStore, batch: u32) -> Explorer<MemoryStore> {
    Explorer::new(
        store.clone(),
        ExplorerConfig {
            search_batch_size: batch,
        },
    )
}

/// Write a job record hash.
pub async fn seed_job(store: &MemoryStore, queue: &str, id: &str, name: &str, data: &str) {
    store
        .set_hash(
            &key(queue, id),
            [
                ("name", name.to_string()),
                ("data", data.to_string()),
                ("timestamp", "1700000000000".to_string()),
                ("attemptsMade", "0".to_string()),
            ],
        )
        .await;
}

/// Queue `emails`: jobs 1-3 waiting, job 4 failed.
pub async fn emails_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .push_list(&key("emails", "wait"), ["1", "2", "3"])
        .await;
    store.add_sorted(&key("emails", "failed"), 1.0, "4").await;
    store.set_hash(&key("emails", "meta"), [("opts.maxLenEvents", "10000")]).await;
    seed_job(&store, "emails", "1", "welcome", r#"{"to":"ada@example.com"}"#).await;
    seed_job(&store, "emails", "2", "welcome", r#"{"to":"grace@example.com"}"#).await;
    seed_job(&store, "emails", "3", "digest", r#"{"to":"alan@example.com","topic":"foo"}"#).await;
    seed_job(&store, "emails", "4", "digest", r#"{"to":"bad@example.com","error":"bounce"}"#).await;
    store
}
