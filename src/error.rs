//! Error types for bullmq-explorer.
//!
//! Absence is not an error here: a missing job or a delete that found
//! nothing are ordinary results (`Option`, [`DeleteOutcome`]).
//!
//! [`DeleteOutcome`]: crate::model::DeleteOutcome

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The store could not be reached, or the connection dropped mid-call.
    #[error("connection error: {0}")]
    Connection(String),

    /// Caller passed a malformed filter, status name or pagination value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store answered, but with an error reply.
    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A cancellable scan was abandoned by its caller.
    #[error("operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when the failure means the store is unreachable.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        if e.is_io_error()
            || e.is_connection_refusal()
            || e.is_connection_dropped()
            || e.is_timeout()
        {
            Error::Connection(e.to_string())
        } else {
            Error::Store(e.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
