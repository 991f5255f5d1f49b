use std::path::PathBuf;

use thiserror::Error;

use crate::error::{classify_reqwest, classify_status, ErrorKind};

/// Errors raised while delivering a staged file.
#[derive(Debug, Error)]
pub enum DistributeError {
    #[error("channel request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel API error: {status} - {description}")]
    Api { status: u16, description: String },

    #[error("staged file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file too large: {size_mb} MB exceeds the {limit_mb} MB upload limit")]
    TooLarge { size_mb: u64, limit_mb: u64 },

    #[error("staging I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("distributor not configured: {0}")]
    NotConfigured(String),

    #[error("failed to parse channel response: {0}")]
    Parse(String),
}

impl DistributeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DistributeError::Http(e) => classify_reqwest(e),
            DistributeError::Api { status, .. } => classify_status(*status),
            DistributeError::MissingFile(_)
            | DistributeError::UnsupportedType(_)
            | DistributeError::TooLarge { .. }
            | DistributeError::Io(_)
            | DistributeError::Parse(_) => ErrorKind::Validation,
            DistributeError::NotConfigured(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientRemote
    }
}
