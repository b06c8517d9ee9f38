//! Redis-backed [`Store`] over a multiplexed connection manager.
//!
//! The manager is cloned per call; clones share one connection and
//! reconnect on their own after a drop.

use super::{CollectionKind, Store};
use crate::error::{Error, Result};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// `COUNT` hint per SCAN round-trip.
const SCAN_COUNT: u64 = 200;

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Open a connection and verify it with `PING`.
    ///
    /// Every failure on this path, including a malformed URL, is reported as
    /// [`Error::Connection`].
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Connection(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        let store = Self { conn };
        store.ping().await?;
        Ok(store)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(())
    }
}

fn range_bounds(offset: u64, limit: u64) -> Result<(isize, isize)> {
    let start = isize::try_from(offset)
        .map_err(|_| Error::InvalidArgument(format!("offset {offset} out of range")))?;
    let stop = isize::try_from(offset.saturating_add(limit) - 1).unwrap_or(isize::MAX);
    Ok((start, stop))
}

impl Store for RedisStore {
    async fn scan_match(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let mut cursor = 0u64;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;
            for raw in batch {
                match String::from_utf8(raw) {
                    Ok(key) => keys.push(key),
                    Err(e) => warn!(error = %e, "skipping non-UTF-8 key"),
                }
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!(pattern, keys = keys.len(), "scan complete");
        Ok(keys)
    }

    async fn collection_kind(&self, key: &str) -> Result<Option<CollectionKind>> {
        let mut conn = self.conn.clone();
        let type_name: String = redis::cmd("TYPE").arg(key).query_async(&mut conn).await?;
        Ok(CollectionKind::from_type_name(&type_name))
    }

    async fn collection_len(&self, key: &str, kind: CollectionKind) -> Result<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = match kind {
            CollectionKind::List => conn.llen(key).await?,
            CollectionKind::SortedSet => conn.zcard(key).await?,
            CollectionKind::Set => conn.scard(key).await?,
        };
        Ok(len)
    }

    async fn collection_range(
        &self,
        key: &str,
        kind: CollectionKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let members: Vec<String> = match kind {
            CollectionKind::List => {
                let (start, stop) = range_bounds(offset, limit)?;
                conn.lrange(key, start, stop).await?
            }
            CollectionKind::SortedSet => {
                let (start, stop) = range_bounds(offset, limit)?;
                conn.zrange(key, start, stop).await?
            }
            CollectionKind::Set => {
                // SMEMBERS order is arbitrary; sort so pages stay stable.
                // Every page re-reads and sorts the whole set, so a batched
                // search over a set costs O(n^2 / batch). No BullMQ status
                // collection is a set; this path only covers foreign layouts.
                let mut all: Vec<String> = conn.smembers(key).await?;
                all.sort();
                all.into_iter()
                    .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                    .take(usize::try_from(limit).unwrap_or(usize::MAX))
                    .collect()
            }
        };
        Ok(members)
    }

    async fn collection_contains(
        &self,
        key: &str,
        kind: CollectionKind,
        member: &str,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();
        let found = match kind {
            CollectionKind::List => {
                let pos: Option<i64> = redis::cmd("LPOS")
                    .arg(key)
                    .arg(member)
                    .query_async(&mut conn)
                    .await?;
                pos.is_some()
            }
            CollectionKind::SortedSet => {
                let score: Option<f64> = conn.zscore(key, member).await?;
                score.is_some()
            }
            CollectionKind::Set => conn.sismember(key, member).await?,
        };
        Ok(found)
    }

    async fn collection_remove(
        &self,
        key: &str,
        kind: CollectionKind,
        member: &str,
    ) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = match kind {
            CollectionKind::List => conn.lrem(key, 0, member).await?,
            CollectionKind::SortedSet => conn.zrem(key, member).await?,
            CollectionKind::Set => conn.srem(key, member).await?,
        };
        Ok(removed > 0)
    }

    async fn hash_get_all(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let mut conn = self.conn.clone();
        let fields: BTreeMap<String, String> = conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn hash_get_all_many(&self, keys: &[String]) -> Result<Vec<BTreeMap<String, String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hgetall(key);
        }
        let records: Vec<BTreeMap<String, String>> = pipe.query_async(&mut conn).await?;
        Ok(records)
    }

    async fn hash_field_many(&self, keys: &[String], field: &str) -> Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.hget(key, field);
        }
        let values: Vec<Option<String>> = pipe.query_async(&mut conn).await?;
        Ok(values)
    }

    async fn delete_key(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn server_info(&self) -> Result<String> {
        let mut conn = self.conn.clone();
        let info: String = redis::cmd("INFO").query_async(&mut conn).await?;
        Ok(info)
    }
}
