//! Periodic refresh of one queue view.
//!
//! Each tick (or explicit [`RefreshHandle::refresh_now`]) starts a fresh
//! snapshot and cancels the previous one if it is still running, so a slow
//! search never piles up behind newer requests. Superseded runs deliver
//! nothing.

use crate::config::DEFAULT_REFRESH_INTERVAL_MS;
use crate::error::{Error, Result};
use crate::model::{JobFilter, JobPage, Queue, ServerHealth, StatusCounts};
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::Explorer;
use super::query::or_cancel;

/// Everything a queue view shows, read in one pass.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub counts: StatusCounts,
    pub page: JobPage,
    pub health: ServerHealth,
    pub taken_at: DateTime<Utc>,
}

/// Builder for a background refresh loop over one queue and filter.
pub struct AutoRefresh<S> {
    explorer: Explorer<S>,
    queue: Queue,
    filter: JobFilter,
    interval: Duration,
    channel_capacity: usize,
}

/// Control handle for a running [`AutoRefresh`] loop.
pub struct RefreshHandle {
    shutdown: CancellationToken,
    trigger: Arc<Notify>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Refresh immediately, superseding any refresh still in flight.
    pub fn refresh_now(&self) {
        self.trigger.notify_one();
    }

    /// Stop the loop, cancel any in-flight refresh and wait for both.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!("auto-refresh task ended abnormally: {e}");
        }
    }
}

impl<S: Store> AutoRefresh<S> {
    pub fn new(explorer: Explorer<S>, queue: Queue, filter: JobFilter) -> Self {
        Self {
            explorer,
            queue,
            filter,
            interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            channel_capacity: 8,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the loop. The first refresh runs immediately.
    ///
    /// Snapshots (or the error that prevented one) arrive on the returned
    /// receiver. Dropping the receiver stops the loop at the next tick.
    pub fn spawn(self) -> (RefreshHandle, mpsc::Receiver<Result<Snapshot>>) {
        let (tx, rx) = mpsc::channel(self.channel_capacity.max(1));
        let shutdown = CancellationToken::new();
        let trigger = Arc::new(Notify::new());
        let task = tokio::spawn(self.run(tx, shutdown.clone(), Arc::clone(&trigger)));
        (
            RefreshHandle {
                shutdown,
                trigger,
                task,
            },
            rx,
        )
    }

    async fn run(
        self,
        tx: mpsc::Sender<Result<Snapshot>>,
        shutdown: CancellationToken,
        trigger: Arc<Notify>,
    ) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<(CancellationToken, JoinHandle<()>)> = None;

        info!(
            queue = %self.queue,
            interval_ms = self.interval.as_millis() as u64,
            "auto-refresh started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
                _ = trigger.notified() => {}
            }
            if tx.is_closed() {
                debug!("snapshot receiver dropped");
                break;
            }

            if let Some((token, task)) = in_flight.take()
                && !task.is_finished()
            {
                debug!("superseding in-flight refresh");
                token.cancel();
            }

            let token = shutdown.child_token();
            let task = tokio::spawn(refresh_once(
                self.explorer.clone(),
                self.queue.clone(),
                self.filter.clone(),
                token.clone(),
                tx.clone(),
            ));
            in_flight = Some((token, task));
        }

        if let Some((token, task)) = in_flight {
            token.cancel();
            let _ = task.await;
        }
        info!(queue = %self.queue, "auto-refresh stopped");
    }
}

async fn refresh_once<S: Store>(
    explorer: Explorer<S>,
    queue: Queue,
    filter: JobFilter,
    token: CancellationToken,
    tx: mpsc::Sender<Result<Snapshot>>,
) {
    match take_snapshot(&explorer, &queue, &filter, &token).await {
        Err(Error::Cancelled) => debug!("refresh cancelled"),
        _ if token.is_cancelled() => debug!("refresh superseded after completion"),
        result => {
            if let Err(e) = &result {
                warn!(queue = %queue, "refresh failed: {e}");
            }
            tokio::select! {
                _ = token.cancelled() => debug!("refresh superseded while delivering"),
                _ = tx.send(result) => {}
            }
        }
    }
}

async fn take_snapshot<S: Store>(
    explorer: &Explorer<S>,
    queue: &Queue,
    filter: &JobFilter,
    token: &CancellationToken,
) -> Result<Snapshot> {
    let counts = or_cancel(token, explorer.counts_by_status(queue)).await?;
    let page = explorer.list_jobs_cancellable(queue, filter, token).await?;
    let health = or_cancel(token, explorer.probe()).await?;
    Ok(Snapshot {
        counts,
        page,
        health,
        taken_at: Utc::now(),
    })
}
