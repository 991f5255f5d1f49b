//! Error types for the publisher module.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::{classify_reqwest, classify_status, ErrorKind};
use crate::retry::Retryable;

/// Errors raised by one publish attempt.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The platform rejected the uploaded media.
    #[error("media processing failed: {0}")]
    ProcessingFailed(String),

    #[error("media still processing after {polls} status checks")]
    ProcessingStuck { polls: u32 },

    #[error("feed credentials are not configured")]
    MissingCredentials,

    #[error("excerpt file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse feed response: {0}")]
    Parse(String),
}

impl PublishError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::Http(e) => classify_reqwest(e),
            PublishError::Api { status, .. } => classify_status(*status),
            PublishError::ProcessingStuck { .. } => ErrorKind::TransientRemote,
            PublishError::MissingCredentials => ErrorKind::Configuration,
            PublishError::ProcessingFailed(_)
            | PublishError::MissingFile(_)
            | PublishError::Io(_)
            | PublishError::Parse(_) => ErrorKind::Validation,
        }
    }
}

impl Retryable for PublishError {
    fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientRemote
    }
}
