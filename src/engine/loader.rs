//! Job record loading and payload decoding.

use crate::error::Result;
use crate::keys::QueueKeys;
use crate::model::{Job, JobDetail, Payload, Queue, Status};
use crate::store::Store;
use crate::telemetry::query::{record_operation, start_query_span};
use std::time::Instant;
use tracing::{Instrument, debug, warn};

fn note_decode_failure(job: &Job) {
    if let Payload::Raw { error, .. } = &job.payload {
        warn!(job_id = %job.id, %error, "job payload is not valid JSON, keeping raw text");
    }
}

impl<S: Store> super::Explorer<S> {
    /// Load one job's record. `Ok(None)` means the record is gone, typically
    /// because the job finished or was removed after it was listed.
    ///
    /// The returned status comes from collection membership, never from the
    /// record itself.
    pub async fn load(&self, queue: &Queue, job_id: &str) -> Result<Option<Job>> {
        Ok(self
            .detail(queue, job_id)
            .await?
            .map(|detail| detail.job))
    }

    /// Load one job together with every collection it currently sits in.
    pub async fn detail(&self, queue: &Queue, job_id: &str) -> Result<Option<JobDetail>> {
        let started = Instant::now();
        let span = start_query_span("load", &queue.name);

        async {
            let fields = self
                .store
                .hash_get_all(&QueueKeys::new(queue).job(job_id))
                .await?;
            if fields.is_empty() {
                debug!(job_id, "job record not found");
                return Ok(None);
            }

            let statuses = self.statuses_of(queue, job_id).await?;
            let mut job = Job::from_fields(job_id, fields);
            job.status = statuses.first().copied();
            note_decode_failure(&job);

            record_operation("load", &queue.name, started);
            Ok(Some(JobDetail::new(job, statuses)))
        }
        .instrument(span)
        .await
    }

    /// Load records for listed ids in one round-trip. Ids whose record has
    /// vanished still produce a row carrying their listed status.
    pub(crate) async fn load_rows(
        &self,
        queue: &Queue,
        rows: &[(String, Status)],
    ) -> Result<Vec<Job>> {
        let keys = QueueKeys::new(queue);
        let record_keys: Vec<String> = rows.iter().map(|(id, _)| keys.job(id)).collect();
        let records = self.store.hash_get_all_many(&record_keys).await?;

        Ok(rows
            .iter()
            .zip(records)
            .map(|((id, status), fields)| {
                if fields.is_empty() {
                    debug!(job_id = %id, "listed job has no record");
                    return Job::vanished(id, *status);
                }
                let job = Job::from_fields(id, fields).with_status(*status);
                note_decode_failure(&job);
                job
            })
            .collect())
    }
}
