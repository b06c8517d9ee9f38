//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. The connection URL can embed a password, so it is wrapped in
//! `secrecy::SecretString` to keep it out of logs.

pub mod secrets;

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::time::Duration;

pub const DEFAULT_PREFIX: &str = "bull";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_SEARCH_BATCH_SIZE: u32 = 200;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 3000;

#[derive(Debug)]
pub struct Config {
    pub redis_url: SecretString,
    /// Namespace prefix shared by every key of one BullMQ deployment.
    pub prefix: String,
    pub page_size: u32,
    /// How many identifiers a search scan materializes per round-trip.
    pub search_batch_size: u32,
    pub refresh_interval: Duration,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_url(None)
    }

    /// Like [`Config::from_env`], but an explicit `redis_url` (e.g. from a
    /// command-line flag) takes precedence over `REDIS_URL`.
    pub fn from_env_with_url(redis_url: Option<String>) -> Result<Self> {
        let redis_url = match redis_url {
            Some(url) => url,
            None => required_var("REDIS_URL")?,
        };
        Ok(Self {
            redis_url: SecretString::from(redis_url),
            prefix: std::env::var("QUEUE_PREFIX")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            page_size: positive_var("PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            search_batch_size: positive_var("SEARCH_BATCH_SIZE", DEFAULT_SEARCH_BATCH_SIZE)?,
            refresh_interval: Duration::from_millis(positive_var(
                "REFRESH_INTERVAL_MS",
                DEFAULT_REFRESH_INTERVAL_MS,
            )?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn positive_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(default);
    };
    let value: T = raw
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a positive integer, got {raw:?}")))?;
    if value <= T::default() {
        return Err(Error::Config(format!("{name} must be greater than zero")));
    }
    Ok(value)
}
