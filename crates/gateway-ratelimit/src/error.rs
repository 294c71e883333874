//! Counter store errors.

use std::time::Duration;
use thiserror::Error;

/// Failure talking to the counter store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("counter store connection failed: {0}")]
    Connection(String),

    /// The store rejected or failed a command
    #[error("counter store command failed: {0}")]
    Command(String),

    /// The store did not answer in time
    #[error("counter store timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            Self::Connection(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout(Duration::ZERO)
        } else {
            Self::Command(err.to_string())
        }
    }
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
