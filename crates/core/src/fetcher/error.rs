use thiserror::Error;

use crate::error::{classify_reqwest, classify_status, ErrorKind};

/// Errors raised while downloading an asset.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("asset name cannot be used as a file name: {0}")]
    InvalidName(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Http(e) => classify_reqwest(e),
            FetchError::Api { status, .. } => classify_status(*status),
            FetchError::Io(_) | FetchError::InvalidName(_) => ErrorKind::Validation,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientRemote
    }
}
