//! Redis key layout of the BullMQ convention.
//!
//! A queue `emails` under prefix `bull` keeps its status collections at
//! `bull:emails:wait`, `bull:emails:delayed`, ..., its metadata hash at
//! `bull:emails:meta`, and each job's record at `bull:emails:<job id>`.

use crate::model::{Queue, Status};

/// Suffix of the per-queue metadata hash.
pub const META_SUFFIX: &str = "meta";

/// Suffix of a job's log list, appended after the job id.
pub const LOGS_SUFFIX: &str = "logs";

/// Collection suffixes that this crate does not list, but that still prove a
/// queue exists. `waiting` is the long form some older producers write.
const EXTRA_COLLECTION_SUFFIXES: [&str; 3] = ["prioritized", "waiting-children", "waiting"];

/// Key builder for one queue.
#[derive(Debug, Clone)]
pub struct QueueKeys {
    base: String,
}

impl QueueKeys {
    pub fn new(queue: &Queue) -> Self {
        Self {
            base: format!("{}:{}", queue.prefix, queue.name),
        }
    }

    pub fn status(&self, status: Status) -> String {
        format!("{}:{}", self.base, status.key_suffix())
    }

    pub fn meta(&self) -> String {
        format!("{}:{META_SUFFIX}", self.base)
    }

    pub fn job(&self, job_id: &str) -> String {
        format!("{}:{job_id}", self.base)
    }

    pub fn job_logs(&self, job_id: &str) -> String {
        format!("{}:{job_id}:{LOGS_SUFFIX}", self.base)
    }
}

/// SCAN pattern matching every key under `prefix`.
pub fn scan_pattern(prefix: &str) -> String {
    format!("{}:*", escape_glob(prefix))
}

/// Escape Redis glob metacharacters so `prefix` matches literally.
pub fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '{' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Extract the queue name from a key, if the key is a status collection or
/// a queue metadata hash under `prefix`. Other shapes yield `None`.
pub fn queue_name_of<'k>(prefix: &str, key: &'k str) -> Option<&'k str> {
    let rest = key.strip_prefix(prefix)?.strip_prefix(':')?;
    let (queue, suffix) = rest.split_once(':')?;
    if queue.is_empty() || !is_queue_level_suffix(suffix) {
        return None;
    }
    Some(queue)
}

fn is_queue_level_suffix(suffix: &str) -> bool {
    suffix == META_SUFFIX
        || Status::ALL.iter().any(|s| s.key_suffix() == suffix)
        || EXTRA_COLLECTION_SUFFIXES.contains(&suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_status_and_meta_keys() {
        assert_eq!(queue_name_of("bull", "bull:emails:wait"), Some("emails"));
        assert_eq!(queue_name_of("bull", "bull:sms:active"), Some("sms"));
        assert_eq!(queue_name_of("bull", "bull:sms:meta"), Some("sms"));
        assert_eq!(queue_name_of("bull", "bull:emails:waiting"), Some("emails"));
        assert_eq!(
            queue_name_of("bull", "bull:sms:waiting-children"),
            Some("sms")
        );
    }

    #[test]
    fn ignores_auxiliary_keys() {
        assert_eq!(queue_name_of("bull", "bull:emails:events"), None);
        assert_eq!(queue_name_of("bull", "bull:emails:id"), None);
        assert_eq!(queue_name_of("bull", "bull:emails:42"), None);
        assert_eq!(queue_name_of("bull", "bull:emails:42:lock"), None);
        assert_eq!(queue_name_of("bull", "bull:emails"), None);
        assert_eq!(queue_name_of("bull", "bullish:emails:wait"), None);
        assert_eq!(queue_name_of("bull", "bull::wait"), None);
    }

    #[test]
    fn multi_segment_prefix() {
        assert_eq!(
            queue_name_of("prod:bull", "prod:bull:emails:failed"),
            Some("emails")
        );
    }

    #[test]
    fn escapes_glob_metacharacters() {
        assert_eq!(scan_pattern("bull"), "bull:*");
        assert_eq!(scan_pattern("a*b?[c]"), "a\\*b\\?\\[c\\]:*");
        assert_eq!(scan_pattern("{app}"), "\\{app\\}:*");
    }

    #[test]
    fn builds_job_keys() {
        let keys = QueueKeys::new(&Queue::new("bull", "emails"));
        assert_eq!(keys.status(Status::Waiting), "bull:emails:wait");
        assert_eq!(keys.job("7"), "bull:emails:7");
        assert_eq!(keys.job_logs("7"), "bull:emails:7:logs");
        assert_eq!(keys.meta(), "bull:emails:meta");
    }
}
