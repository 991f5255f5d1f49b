use thiserror::Error;

use crate::error::{classify_reqwest, classify_status, ErrorKind};

/// Errors raised while listing the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("catalog folder not found: {0}")]
    NotFound(String),

    #[error("failed to parse catalog response: {0}")]
    Parse(String),

    #[error("catalog not configured: {0}")]
    NotConfigured(String),
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Http(e) => classify_reqwest(e),
            CatalogError::Api { status, .. } => classify_status(*status),
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::Parse(_) => ErrorKind::Validation,
            CatalogError::NotConfigured(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientRemote
    }
}
