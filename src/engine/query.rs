//! Job queries: per-status counts and merged, searchable, paginated listings.
//!
//! Listings walk the status collections in enumeration order and each
//! collection in its native order. Without a search term, only the ids of
//! the requested page are read and only their records are loaded. With a
//! search term every in-scope id has to be checked against its payload, so
//! the scan reads ids and `data` fields batch by batch, checking the
//! cancellation token between round-trips.

use crate::error::{Error, Result};
use crate::keys::QueueKeys;
use crate::model::{JobFilter, JobPage, Queue, Status, StatusCounts, search_matches};
use crate::store::{CollectionKind, Store};
use crate::telemetry::metrics;
use crate::telemetry::query::{record_operation, record_scan, start_query_span};
use opentelemetry::KeyValue;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug};

/// Field of the job hash holding the JSON payload.
const DATA_FIELD: &str = "data";

/// Await `fut` unless `cancel` fires first.
pub(crate) async fn or_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

impl<S: Store> super::Explorer<S> {
    /// Count every status of `queue`. Statuses without a collection are 0.
    pub async fn counts_by_status(&self, queue: &Queue) -> Result<StatusCounts> {
        let mut counts = BTreeMap::new();
        for status in Status::ALL {
            counts.insert(status, self.count(queue, status).await?);
        }
        Ok(StatusCounts(counts))
    }

    /// One page of jobs matching `filter`, plus the total number matching.
    pub async fn list_jobs(&self, queue: &Queue, filter: &JobFilter) -> Result<JobPage> {
        self.list_jobs_cancellable(queue, filter, &CancellationToken::new())
            .await
    }

    /// [`list_jobs`](Self::list_jobs) that gives up with [`Error::Cancelled`]
    /// as soon as `cancel` fires.
    pub async fn list_jobs_cancellable(
        &self,
        queue: &Queue,
        filter: &JobFilter,
        cancel: &CancellationToken,
    ) -> Result<JobPage> {
        filter.validate()?;
        let started = Instant::now();
        let span = start_query_span("list", &queue.name);

        async {
            let in_scope = filter.status.statuses();
            let collections: Vec<_> = or_cancel(cancel, self.collection_kinds(queue))
                .await?
                .into_iter()
                .filter(|(status, _, _)| in_scope.contains(status))
                .collect();

            let (rows, total_matching) = match filter.search.as_deref() {
                None => self.page_by_offset(&collections, filter, cancel).await?,
                Some(term) => {
                    self.page_by_search(queue, &collections, filter, term, cancel, &Span::current())
                        .await?
                }
            };

            let jobs = or_cancel(cancel, self.load_rows(queue, &rows)).await?;
            debug!(rows = jobs.len(), total_matching, "listing assembled");
            record_operation("list", &queue.name, started);
            Ok(JobPage {
                jobs,
                total_matching,
            })
        }
        .instrument(span)
        .await
    }

    /// Search-free paging: sum collection sizes, read ids only where the
    /// requested window overlaps a collection.
    async fn page_by_offset(
        &self,
        collections: &[(Status, String, Option<CollectionKind>)],
        filter: &JobFilter,
        cancel: &CancellationToken,
    ) -> Result<(Vec<(String, Status)>, u64)> {
        let limit = u64::from(filter.page_size);
        let mut next = filter.offset();
        let mut total = 0u64;
        let mut rows = Vec::new();

        for (status, key, kind) in collections {
            let Some(kind) = *kind else {
                continue;
            };
            let len = or_cancel(cancel, self.store.collection_len(key, kind)).await?;
            let end = total + len;
            let wanted = limit - rows.len() as u64;
            if wanted > 0 && next < end {
                let local = next.saturating_sub(total);
                let ids = or_cancel(
                    cancel,
                    self.store
                        .collection_range(key, kind, local, wanted.min(len - local)),
                )
                .await?;
                rows.extend(ids.into_iter().map(|id| (id, *status)));
                next = end;
            }
            total = end;
        }
        Ok((rows, total))
    }

    /// Search paging: every in-scope id is checked, matches are counted, and
    /// only matches falling in the requested window are kept.
    async fn page_by_search(
        &self,
        queue: &Queue,
        collections: &[(Status, String, Option<CollectionKind>)],
        filter: &JobFilter,
        term: &str,
        cancel: &CancellationToken,
        span: &Span,
    ) -> Result<(Vec<(String, Status)>, u64)> {
        let needle = term.to_lowercase();
        let batch = u64::from(self.config.search_batch_size.max(1));
        let window_start = filter.offset();
        let window_end = window_start + u64::from(filter.page_size);
        let keys = QueueKeys::new(queue);

        let mut matched = 0u64;
        let mut scanned = 0u64;
        let mut rows = Vec::new();

        for (status, key, kind) in collections {
            let Some(kind) = *kind else {
                continue;
            };
            let mut local = 0u64;
            loop {
                if cancel.is_cancelled() {
                    debug!(scanned, matched, "search abandoned");
                    return Err(Error::Cancelled);
                }
                let ids =
                    or_cancel(cancel, self.store.collection_range(key, kind, local, batch)).await?;
                if ids.is_empty() {
                    break;
                }
                let record_keys: Vec<String> = ids.iter().map(|id| keys.job(id)).collect();
                let payloads =
                    or_cancel(cancel, self.store.hash_field_many(&record_keys, DATA_FIELD)).await?;

                for (id, data) in ids.iter().zip(payloads) {
                    if search_matches(id, data.as_deref(), &needle) {
                        if (window_start..window_end).contains(&matched) {
                            rows.push((id.clone(), *status));
                        }
                        matched += 1;
                    }
                }

                let fetched = ids.len() as u64;
                scanned += fetched;
                local += fetched;
                if fetched < batch {
                    break;
                }
            }
        }

        record_scan(span, scanned, matched);
        metrics::search_scanned().add(scanned, &[KeyValue::new("queue", queue.name.clone())]);
        Ok((rows, matched))
    }
}
