//! In-process [`Store`] with Redis semantics, for tests and embedding.
//!
//! Holds the keyspace behind a shared lock, so clones see the same data.
//! Writers (`push_list`, `add_sorted`, ...) exist only to seed state; the
//! engine itself never writes beyond deletion.

use super::{CollectionKind, Store};
use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Value {
    List(Vec<String>),
    SortedSet(Vec<(f64, String)>),
    Set(BTreeSet<String>),
    Hash(BTreeMap<String, String>),
    Plain(String),
}

#[derive(Debug, Default)]
struct Inner {
    keys: RwLock<BTreeMap<String, Value>>,
    info: RwLock<String>,
    offline: AtomicBool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append ids to a list, as `RPUSH` would.
    pub async fn push_list<I, T>(&self, key: &str, members: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut keys = self.inner.keys.write().await;
        let entry = keys
            .entry(key.to_string())
            .or_insert_with(|| Value::List(Vec::new()));
        if let Value::List(list) = entry {
            list.extend(members.into_iter().map(Into::into));
        }
    }

    /// Add a scored member, as `ZADD` would (re-adding updates the score).
    pub async fn add_sorted(&self, key: &str, score: f64, member: impl Into<String>) {
        let member = member.into();
        let mut keys = self.inner.keys.write().await;
        let entry = keys
            .entry(key.to_string())
            .or_insert_with(|| Value::SortedSet(Vec::new()));
        if let Value::SortedSet(set) = entry {
            set.retain(|(_, m)| *m != member);
            set.push((score, member));
            set.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        }
    }

    pub async fn add_set<I, T>(&self, key: &str, members: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut keys = self.inner.keys.write().await;
        let entry = keys
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(BTreeSet::new()));
        if let Value::Set(set) = entry {
            set.extend(members.into_iter().map(Into::into));
        }
    }

    pub async fn set_hash<I, K, V>(&self, key: &str, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut keys = self.inner.keys.write().await;
        let entry = keys
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(BTreeMap::new()));
        if let Value::Hash(hash) = entry {
            hash.extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        }
    }

    /// Store a plain string value (counters, locks, and the like).
    pub async fn set_string(&self, key: &str, value: impl Into<String>) {
        self.inner
            .keys
            .write()
            .await
            .insert(key.to_string(), Value::Plain(value.into()));
    }

    /// Read back a plain string value, as `GET` would.
    pub async fn get_string(&self, key: &str) -> Option<String> {
        match self.inner.keys.read().await.get(key) {
            Some(Value::Plain(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Canned reply for `INFO`.
    pub async fn set_info(&self, info: impl Into<String>) {
        *self.inner.info.write().await = info.into();
    }

    /// While offline, every call fails with [`Error::Connection`].
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.inner.keys.read().await.contains_key(key)
    }

    fn check_online(&self) -> Result<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(Error::Connection("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

fn wrong_type(key: &str) -> Error {
    Error::Store(format!(
        "WRONGTYPE Operation against a key holding the wrong kind of value: {key}"
    ))
}

fn kind_of(value: &Value) -> Option<CollectionKind> {
    match value {
        Value::List(_) => Some(CollectionKind::List),
        Value::SortedSet(_) => Some(CollectionKind::SortedSet),
        Value::Set(_) => Some(CollectionKind::Set),
        Value::Hash(_) | Value::Plain(_) => None,
    }
}

fn members_of(value: &Value) -> Vec<&String> {
    match value {
        Value::List(list) => list.iter().collect(),
        Value::SortedSet(set) => set.iter().map(|(_, m)| m).collect(),
        Value::Set(set) => set.iter().collect(),
        Value::Hash(_) | Value::Plain(_) => Vec::new(),
    }
}

fn hash_fields(keys: &BTreeMap<String, Value>, key: &str) -> Result<BTreeMap<String, String>> {
    match keys.get(key) {
        None => Ok(BTreeMap::new()),
        Some(Value::Hash(hash)) => Ok(hash.clone()),
        Some(_) => Err(wrong_type(key)),
    }
}

/// Compile a Redis-style glob: `*` and `?` cross `:` boundaries and `\`
/// escapes the next character.
pub(crate) fn glob_matcher(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(false)
        .backslash_escape(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|e| Error::Store(format!("invalid match pattern {pattern:?}: {e}")))
}

impl Store for MemoryStore {
    async fn scan_match(&self, pattern: &str) -> Result<Vec<String>> {
        self.check_online()?;
        let matcher = glob_matcher(pattern)?;
        let keys = self.inner.keys.read().await;
        Ok(keys
            .keys()
            .filter(|key| matcher.is_match(key.as_str()))
            .cloned()
            .collect())
    }

    async fn collection_kind(&self, key: &str) -> Result<Option<CollectionKind>> {
        self.check_online()?;
        let keys = self.inner.keys.read().await;
        Ok(keys.get(key).and_then(kind_of))
    }

    async fn collection_len(&self, key: &str, kind: CollectionKind) -> Result<u64> {
        self.check_online()?;
        let keys = self.inner.keys.read().await;
        match keys.get(key) {
            None => Ok(0),
            Some(value) if kind_of(value) == Some(kind) => Ok(members_of(value).len() as u64),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn collection_range(
        &self,
        key: &str,
        kind: CollectionKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>> {
        self.check_online()?;
        let keys = self.inner.keys.read().await;
        match keys.get(key) {
            None => Ok(Vec::new()),
            Some(value) if kind_of(value) == Some(kind) => Ok(members_of(value)
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .cloned()
                .collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn collection_contains(
        &self,
        key: &str,
        kind: CollectionKind,
        member: &str,
    ) -> Result<bool> {
        self.check_online()?;
        let keys = self.inner.keys.read().await;
        match keys.get(key) {
            None => Ok(false),
            Some(value) if kind_of(value) == Some(kind) => {
                Ok(members_of(value).into_iter().any(|m| m == member))
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn collection_remove(
        &self,
        key: &str,
        kind: CollectionKind,
        member: &str,
    ) -> Result<bool> {
        self.check_online()?;
        let mut keys = self.inner.keys.write().await;
        let Some(value) = keys.get_mut(key) else {
            return Ok(false);
        };
        if kind_of(value) != Some(kind) {
            return Err(wrong_type(key));
        }
        let (removed, now_empty) = match value {
            Value::List(list) => {
                let before = list.len();
                list.retain(|m| m != member);
                (list.len() != before, list.is_empty())
            }
            Value::SortedSet(set) => {
                let before = set.len();
                set.retain(|(_, m)| m != member);
                (set.len() != before, set.is_empty())
            }
            Value::Set(set) => (set.remove(member), set.is_empty()),
            Value::Hash(_) | Value::Plain(_) => (false, false),
        };
        // Redis drops a collection key once its last member is gone.
        if now_empty {
            keys.remove(key);
        }
        Ok(removed)
    }

    async fn hash_get_all(&self, key: &str) -> Result<BTreeMap<String, String>> {
        self.check_online()?;
        let keys = self.inner.keys.read().await;
        hash_fields(&keys, key)
    }

    async fn hash_get_all_many(&self, keys: &[String]) -> Result<Vec<BTreeMap<String, String>>> {
        self.check_online()?;
        let store = self.inner.keys.read().await;
        keys.iter().map(|key| hash_fields(&store, key)).collect()
    }

    async fn hash_field_many(&self, keys: &[String], field: &str) -> Result<Vec<Option<String>>> {
        self.check_online()?;
        let store = self.inner.keys.read().await;
        keys.iter()
            .map(|key| hash_fields(&store, key).map(|mut fields| fields.remove(field)))
            .collect()
    }

    async fn delete_key(&self, key: &str) -> Result<bool> {
        self.check_online()?;
        Ok(self.inner.keys.write().await.remove(key).is_some())
    }

    async fn server_info(&self) -> Result<String> {
        self.check_online()?;
        Ok(self.inner.info.read().await.clone())
    }
}
