//! Status index: size and paged ids of one status collection.

use crate::error::{Error, Result};
use crate::keys::QueueKeys;
use crate::model::{Queue, Status};
use crate::store::{CollectionKind, Store};
use crate::telemetry::query::record_operation;
use std::time::Instant;

impl<S: Store> super::Explorer<S> {
    /// Number of jobs in `status` for `queue`. A missing collection counts 0.
    pub async fn count(&self, queue: &Queue, status: Status) -> Result<u64> {
        let started = Instant::now();
        let key = QueueKeys::new(queue).status(status);
        let count = match self.store.collection_kind(&key).await? {
            Some(kind) => self.store.collection_len(&key, kind).await?,
            None => 0,
        };
        record_operation("count", &queue.name, started);
        Ok(count)
    }

    /// Up to `limit` job ids from `status`, starting at `offset`, in the
    /// collection's native order. An offset past the end yields no ids.
    pub async fn page(
        &self,
        queue: &Queue,
        status: Status,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>> {
        if limit == 0 {
            return Err(Error::InvalidArgument("limit must be >= 1".to_string()));
        }
        let started = Instant::now();
        let key = QueueKeys::new(queue).status(status);
        let ids = match self.store.collection_kind(&key).await? {
            Some(kind) => self.store.collection_range(&key, kind, offset, limit).await?,
            None => Vec::new(),
        };
        record_operation("page", &queue.name, started);
        Ok(ids)
    }

    /// Statuses whose collection currently holds `job_id`, in enumeration order.
    pub async fn statuses_of(&self, queue: &Queue, job_id: &str) -> Result<Vec<Status>> {
        let keys = QueueKeys::new(queue);
        let mut found = Vec::new();
        for status in Status::ALL {
            let key = keys.status(status);
            if let Some(kind) = self.store.collection_kind(&key).await?
                && self.store.collection_contains(&key, kind, job_id).await?
            {
                found.push(status);
            }
        }
        Ok(found)
    }

    /// Kind of every status collection of `queue`; `None` where absent.
    pub(crate) async fn collection_kinds(
        &self,
        queue: &Queue,
    ) -> Result<Vec<(Status, String, Option<CollectionKind>)>> {
        let keys = QueueKeys::new(queue);
        let mut kinds = Vec::with_capacity(Status::ALL.len());
        for status in Status::ALL {
            let key = keys.status(status);
            let kind = self.store.collection_kind(&key).await?;
            kinds.push((status, key, kind));
        }
        Ok(kinds)
    }
}
