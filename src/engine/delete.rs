//! Job deletion across every collection that may reference it.
//!
//! A job mid-transition can sit in two collections at once, so removal fans
//! out to all of them plus the record and its log list. Each removal is
//! independently idempotent; there is no cross-key transaction.

use crate::error::Result;
use crate::keys::QueueKeys;
use crate::model::{DeleteOutcome, Queue};
use crate::store::Store;
use crate::telemetry::metrics;
use crate::telemetry::query::{record_operation, start_query_span};
use opentelemetry::KeyValue;
use std::time::Instant;
use tracing::{Instrument, debug, info};

impl<S: Store> super::Explorer<S> {
    /// Remove `job_id` from every status collection of `queue`, and delete its
    /// record and logs.
    ///
    /// Returns [`DeleteOutcome::NotFoundAnywhere`] when neither the record nor
    /// any collection entry existed; deleting twice is therefore harmless.
    pub async fn delete(&self, queue: &Queue, job_id: &str) -> Result<DeleteOutcome> {
        let started = Instant::now();
        let span = start_query_span("delete", &queue.name);

        async {
            let keys = QueueKeys::new(queue);
            let mut removed_from = Vec::new();
            for (status, key, kind) in self.collection_kinds(queue).await? {
                let Some(kind) = kind else {
                    continue;
                };
                if self.store.collection_remove(&key, kind, job_id).await? {
                    removed_from.push(status);
                }
            }

            let record_removed = self.store.delete_key(&keys.job(job_id)).await?;
            if self.store.delete_key(&keys.job_logs(job_id)).await? {
                debug!(job_id, "job logs removed");
            }

            let outcome = if record_removed || !removed_from.is_empty() {
                info!(job_id, ?removed_from, record_removed, "job deleted");
                DeleteOutcome::Deleted {
                    removed_from,
                    record_removed,
                }
            } else {
                debug!(job_id, "job not found anywhere");
                DeleteOutcome::NotFoundAnywhere
            };

            metrics::jobs_deleted().add(
                1,
                &[
                    KeyValue::new("queue", queue.name.clone()),
                    KeyValue::new(
                        "result",
                        if outcome.is_deleted() {
                            "deleted"
                        } else {
                            "not_found"
                        },
                    ),
                ],
            );
            record_operation("delete", &queue.name, started);
            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}
