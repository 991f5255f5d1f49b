//! Error types for the cache module.

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors raised while talking to the backing store.
///
/// These never leave the cache: they are logged and turned into a degraded
/// answer (`None` / `false`).
#[derive(Debug, Error)]
pub enum CacheError {
    /// Could not establish a connection.
    #[error("cache connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection attempt exceeded the configured timeout.
    #[error("cache connection timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Command failed on an established connection.
    #[error("cache command failed: {0}")]
    Command(String),
}

impl CacheError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::CacheUnavailable
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            CacheError::ConnectionFailed(e.to_string())
        } else {
            CacheError::Command(e.to_string())
        }
    }
}
