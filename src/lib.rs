//! # bullmq-explorer
//!
//! Read-side introspection of BullMQ job queues, reconstructed purely from
//! the Redis keyspace: queue discovery, per-status counts, merged and
//! searchable job listings, job detail, fan-out deletion and server health.
//!
//! ```no_run
//! # async fn demo() -> bullmq_explorer::error::Result<()> {
//! use bullmq_explorer::engine::Explorer;
//! use bullmq_explorer::model::{JobFilter, Status};
//!
//! let explorer = Explorer::connect("redis://127.0.0.1:6379").await?;
//! for queue in explorer.discover("bull").await? {
//!     let counts = explorer.counts_by_status(&queue).await?;
//!     let failed = explorer
//!         .list_jobs(&queue, &JobFilter::new().status(Status::Failed))
//!         .await?;
//!     println!("{queue}: {} jobs, {} failed", counts.total(), failed.total_matching);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod model;
pub mod store;
pub mod telemetry;
