//! Queue introspection engine.
//!
//! [`Explorer`] reconstructs queue and job state from the raw keyspace. Its
//! operations are split by concern:
//!
//! - [`discovery`]: queue names under a prefix
//! - [`index`]: per-status counts and id pages
//! - [`loader`]: job record decoding and detail
//! - [`query`]: merged, filtered, paginated listings
//! - [`delete`]: fan-out removal of one job
//! - [`health`]: server `INFO` parsing
//! - [`refresh`]: periodic snapshots with superseding cancellation

pub mod delete;
pub mod discovery;
pub mod health;
pub mod index;
pub mod loader;
pub mod query;
pub mod refresh;

pub use refresh::{AutoRefresh, RefreshHandle, Snapshot};

use crate::config::{Config, DEFAULT_SEARCH_BATCH_SIZE};
use crate::config::secrets::{ExposeSecret, redacted_url};
use crate::error::Result;
use crate::store::{RedisStore, Store};
use tracing::info;

/// Tuning knobs for the engine.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Identifiers materialized per round-trip while a search scans.
    pub search_batch_size: u32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            search_batch_size: DEFAULT_SEARCH_BATCH_SIZE,
        }
    }
}

impl From<&Config> for ExplorerConfig {
    fn from(config: &Config) -> Self {
        Self {
            search_batch_size: config.search_batch_size,
        }
    }
}

/// Read-side view over one store. Cheap to clone; clones share the store
/// handle and nothing else.
#[derive(Debug, Clone)]
pub struct Explorer<S> {
    store: S,
    config: ExplorerConfig,
}

impl<S: Store> Explorer<S> {
    pub fn new(store: S, config: ExplorerConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }
}

impl Explorer<RedisStore> {
    /// Connect to Redis at `url` with default settings.
    pub async fn connect(url: &str) -> Result<Self> {
        let store = RedisStore::connect(url).await?;
        info!("connected to redis");
        Ok(Self::new(store, ExplorerConfig::default()))
    }

    /// Connect using a loaded [`Config`].
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = RedisStore::connect(config.redis_url.expose_secret()).await?;
        info!(url = %redacted_url(&config.redis_url), "connected to redis");
        Ok(Self::new(store, ExplorerConfig::from(config)))
    }
}
