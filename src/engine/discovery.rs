//! Queue discovery: derive queue names from the keys under a prefix.

use crate::error::{Error, Result};
use crate::keys;
use crate::model::Queue;
use crate::store::Store;
use crate::telemetry::query::{record_operation, start_query_span};
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{Instrument, debug, info};

impl<S: Store> super::Explorer<S> {
    /// Scan the keyspace under `prefix` and return the distinct queues found,
    /// sorted by name.
    ///
    /// Only status-collection and queue-meta keys are recognized; every other
    /// key shape is ignored. A prefix matching nothing yields an empty list.
    pub async fn discover(&self, prefix: &str) -> Result<Vec<Queue>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::InvalidArgument("prefix must not be empty".to_string()));
        }
        let started = Instant::now();
        let span = start_query_span("discover", prefix);

        async {
            let found = self.store.scan_match(&keys::scan_pattern(prefix)).await?;
            let names: BTreeSet<&str> = found
                .iter()
                .filter_map(|key| keys::queue_name_of(prefix, key))
                .collect();
            debug!(prefix, scanned = found.len(), "keyspace scanned");
            info!(prefix, queues = names.len(), "queues discovered");
            record_operation("discover", prefix, started);
            Ok(names
                .into_iter()
                .map(|name| Queue::new(prefix, name))
                .collect())
        }
        .instrument(span)
        .await
    }
}
