//! Core data model.
//!
//! Everything here is a projection over the Redis keyspace. Queues and status
//! membership have no identity of their own: a queue exists because keys under
//! its name exist, and a job's status is whichever collection holds its id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

/// A queue discovered under a namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Queue {
    pub prefix: String,
    pub name: String,
}

impl Queue {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.prefix, self.name)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a job, as implied by the collection holding its id.
///
/// Declaration order is the fixed enumeration order used for merged listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Waiting,
    Active,
    Delayed,
    Completed,
    Failed,
    Paused,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Waiting,
        Status::Active,
        Status::Delayed,
        Status::Completed,
        Status::Failed,
        Status::Paused,
    ];

    /// Key suffix of this status's collection, e.g. `bull:emails:wait`.
    pub fn key_suffix(self) -> &'static str {
        match self {
            Status::Waiting => "wait",
            Status::Active => "active",
            Status::Delayed => "delayed",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Paused => "paused",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Waiting => "waiting",
            Status::Active => "active",
            Status::Delayed => "delayed",
            Status::Completed => "completed",
            Status::Failed => "failed",
            Status::Paused => "paused",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "waiting" | "wait" => Ok(Status::Waiting),
            "active" => Ok(Status::Active),
            "delayed" => Ok(Status::Delayed),
            "completed" => Ok(Status::Completed),
            "failed" => Ok(Status::Failed),
            "paused" => Ok(Status::Paused),
            other => Err(Error::InvalidArgument(format!("unknown status: {other:?}"))),
        }
    }
}

/// Which status collections a listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// Statuses in scope, in enumeration order.
    pub fn statuses(self) -> Vec<Status> {
        match self {
            StatusFilter::All => Status::ALL.to_vec(),
            StatusFilter::Only(status) => vec![status],
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

impl From<Status> for StatusFilter {
    fn from(status: Status) -> Self {
        StatusFilter::Only(status)
    }
}

/// Per-status job counts. Every status is present, absent collections as 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts(pub BTreeMap<Status, u64>);

impl StatusCounts {
    pub fn get(&self, status: Status) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Maximum length, in characters, of a listing row's payload preview.
pub const PREVIEW_CHARS: usize = 140;

/// A job's `data` field, decoded when it is valid JSON.
///
/// The stored text is kept alongside the decoded value: search runs against
/// what the producer wrote, not a re-serialization of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// The record has no `data` field (or no record at all).
    Missing,
    Decoded {
        value: serde_json::Value,
        text: String,
    },
    /// Not valid JSON. `error` is the decoder's message.
    Raw { text: String, error: String },
}

impl Payload {
    pub fn from_field(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Payload::Missing,
            Some(text) => match serde_json::from_str(text) {
                Ok(value) => Payload::Decoded {
                    value,
                    text: text.to_string(),
                },
                Err(e) => Payload::Raw {
                    text: text.to_string(),
                    error: e.to_string(),
                },
            },
        }
    }

    /// The `data` field exactly as stored.
    pub fn source(&self) -> Option<&str> {
        match self {
            Payload::Missing => None,
            Payload::Decoded { text, .. } | Payload::Raw { text, .. } => Some(text.as_str()),
        }
    }

    /// Single-line rendering: compact JSON in the producer's key order, or
    /// the raw text.
    pub fn compact(&self) -> String {
        match self {
            Payload::Missing => String::new(),
            Payload::Decoded { value, .. } => value.to_string(),
            Payload::Raw { text, .. } => text.clone(),
        }
    }

    /// Indented JSON when decodable, else the raw text unchanged.
    pub fn pretty(&self) -> String {
        match self {
            Payload::Decoded { value, .. } => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            other => other.compact(),
        }
    }

    pub fn preview(&self) -> String {
        let compact = self.compact();
        match compact.char_indices().nth(PREVIEW_CHARS) {
            Some((cut, _)) => compact[..cut].to_string(),
            None => compact,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Payload::Missing)
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A job as reconstructed from its metadata hash and collection membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,
    /// Collection-derived status. `None` when the id is in no known collection.
    pub status: Option<Status>,
    pub payload: Payload,
    /// Creation time, from the record's epoch-millisecond `timestamp` field.
    pub timestamp: Option<DateTime<Utc>>,
    pub attempts_made: u32,
    pub failed_reason: Option<String>,
    /// Every other field of the record, verbatim.
    pub raw_fields: BTreeMap<String, String>,
}

impl Job {
    /// Decode a job from its metadata hash fields.
    pub fn from_fields(id: &str, mut fields: BTreeMap<String, String>) -> Self {
        let name = fields.remove("name").unwrap_or_default();
        let payload = Payload::from_field(fields.remove("data").as_deref());
        let timestamp = fields
            .remove("timestamp")
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis);
        let attempts_made = fields
            .remove("attemptsMade")
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let failed_reason = fields.remove("failedReason").filter(|r| !r.is_empty());

        Self {
            id: id.to_string(),
            name,
            status: None,
            payload,
            timestamp,
            attempts_made,
            failed_reason,
            raw_fields: fields,
        }
    }

    /// Placeholder for an id whose record vanished after it was listed.
    pub fn vanished(id: &str, status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::from_fields(id, BTreeMap::new())
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Does this job match a search term (case-insensitive, id or stored
    /// payload text)?
    pub fn matches(&self, term: &str) -> bool {
        search_matches(&self.id, self.payload.source(), &term.to_lowercase())
    }
}

/// `needle` must already be lowercased. `data` is the stored payload text.
pub(crate) fn search_matches(id: &str, data: Option<&str>, needle: &str) -> bool {
    id.to_lowercase().contains(needle)
        || data.is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Job detail as surfaced to a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    pub id: String,
    pub name: String,
    pub status: Option<Status>,
    /// All collections the id was found in; more than one mid-transition.
    pub statuses: Vec<Status>,
    pub data_pretty: String,
    /// Whether there is raw payload text to copy.
    pub raw_available: bool,
    pub job: Job,
}

impl JobDetail {
    pub fn new(job: Job, statuses: Vec<Status>) -> Self {
        Self {
            id: job.id.clone(),
            name: job.name.clone(),
            status: job.status,
            statuses,
            data_pretty: job.payload.pretty(),
            raw_available: !job.payload.is_missing(),
            job,
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Filter for [`Explorer::list_jobs`](crate::engine::Explorer::list_jobs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    pub status: StatusFilter,
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub page_size: u32,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            search: None,
            page: 1,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: impl Into<StatusFilter>) -> Self {
        self.status = status.into();
        self
    }

    /// Blank terms are treated as no search.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() {
            None
        } else {
            Some(term)
        };
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(Error::InvalidArgument("page must be >= 1".to_string()));
        }
        if self.page_size == 0 {
            return Err(Error::InvalidArgument("page_size must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Offset of the first row of the requested page.
    pub(crate) fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.page_size)
    }
}

/// One page of a listing plus the number of jobs matching overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total_matching: u64,
}

impl JobPage {
    pub fn total_pages(&self, page_size: u32) -> u64 {
        self.total_matching.div_ceil(u64::from(page_size.max(1))).max(1)
    }
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteOutcome {
    Deleted {
        /// Collections the id was actually removed from.
        removed_from: Vec<Status>,
        record_removed: bool,
    },
    /// Nothing referenced the job. Benign: it is already gone.
    NotFoundAnywhere,
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted { .. })
    }
}

// ---------------------------------------------------------------------------
// Server health
// ---------------------------------------------------------------------------

/// Rendering of any health field the server did not report.
pub const UNKNOWN: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    Standalone,
    Cluster,
    Sentinel,
    Other(String),
}

impl std::fmt::Display for ServerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerMode::Standalone => write!(f, "standalone"),
            ServerMode::Cluster => write!(f, "cluster"),
            ServerMode::Sentinel => write!(f, "sentinel"),
            ServerMode::Other(mode) => write!(f, "{mode}"),
        }
    }
}

/// Point-in-time server snapshot. `None` fields mean "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerHealth {
    pub version: Option<String>,
    pub mode: Option<ServerMode>,
    pub used_memory: Option<u64>,
    /// System memory, or `maxmemory` when the former is not reported.
    pub total_memory: Option<u64>,
    pub connected_clients: Option<u64>,
}

impl ServerHealth {
    pub fn version_display(&self) -> &str {
        self.version.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn mode_display(&self) -> String {
        self.mode
            .as_ref()
            .map_or_else(|| UNKNOWN.to_string(), ToString::to_string)
    }

    pub fn used_memory_display(&self) -> String {
        self.used_memory
            .map_or_else(|| UNKNOWN.to_string(), format_bytes)
    }

    pub fn total_memory_display(&self) -> String {
        self.total_memory
            .map_or_else(|| UNKNOWN.to_string(), format_bytes)
    }

    pub fn clients_display(&self) -> String {
        self.connected_clients
            .map_or_else(|| UNKNOWN.to_string(), |n| n.to_string())
    }
}

/// Human-readable byte size in Redis's own style (`1.50M`, `12.00K`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["K", "M", "G", "T", "P"];
    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2}{}", UNITS[unit])
}
