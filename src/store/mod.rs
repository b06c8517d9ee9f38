//! Key-value store access.
//!
//! The [`Store`] trait is the exact command surface the engine consumes.
//! [`RedisStore`] talks to a live server; [`MemoryStore`] keeps the same
//! semantics in-process for tests and embedding.

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use crate::error::Result;
use std::collections::BTreeMap;
use std::future::Future;

/// Structural kind of a key that can back a status collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Ordered list (`LRANGE` order).
    List,
    /// Score-ordered set.
    SortedSet,
    /// Unordered set; paged in lexicographic member order for stability.
    Set,
}

impl CollectionKind {
    /// Map a `TYPE` reply. `None` covers missing keys and kinds that cannot
    /// hold job ids.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "list" => Some(CollectionKind::List),
            "zset" => Some(CollectionKind::SortedSet),
            "set" => Some(CollectionKind::Set),
            _ => None,
        }
    }
}

/// Command surface over a Redis-compatible store.
///
/// Every method is an independent round-trip (or one pipeline); nothing is
/// held between calls, so a store handle can be cloned freely across tasks.
pub trait Store: Clone + Send + Sync + 'static {
    /// All keys matching a glob `pattern`. Keys that are not valid UTF-8 are
    /// skipped.
    fn scan_match(&self, pattern: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Kind of `key`, or `None` if it is missing or not a collection.
    fn collection_kind(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<CollectionKind>>> + Send;

    fn collection_len(
        &self,
        key: &str,
        kind: CollectionKind,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Up to `limit` members starting at `offset`, in the collection's order.
    fn collection_range(
        &self,
        key: &str,
        kind: CollectionKind,
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn collection_contains(
        &self,
        key: &str,
        kind: CollectionKind,
        member: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Remove every occurrence of `member`. Returns whether anything was removed.
    fn collection_remove(
        &self,
        key: &str,
        kind: CollectionKind,
        member: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// All fields of a hash. A missing key yields an empty map.
    fn hash_get_all(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<BTreeMap<String, String>>> + Send;

    /// [`Store::hash_get_all`] for many keys in one round-trip.
    fn hash_get_all_many(
        &self,
        keys: &[String],
    ) -> impl Future<Output = Result<Vec<BTreeMap<String, String>>>> + Send;

    /// One field from each of many hashes, in one round-trip.
    fn hash_field_many(
        &self,
        keys: &[String],
        field: &str,
    ) -> impl Future<Output = Result<Vec<Option<String>>>> + Send;

    /// Delete `key`. Returns whether it existed.
    fn delete_key(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Raw `INFO` text.
    fn server_info(&self) -> impl Future<Output = Result<String>> + Send;
}
