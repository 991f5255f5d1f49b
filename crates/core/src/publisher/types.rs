//! Types for the publisher module.

use serde::Serialize;

use crate::error::ErrorKind;
use crate::retry::RetryAttempt;

/// Platform-side processing state of uploaded media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Ready,
    Failed(String),
}

impl ProcessingStatus {
    /// Map a platform state string onto a status.
    ///
    /// Unknown states are treated as still pending.
    pub fn from_state(state: &str, error: Option<String>) -> Self {
        match state {
            "succeeded" => ProcessingStatus::Ready,
            "failed" => ProcessingStatus::Failed(error.unwrap_or_else(|| "unknown error".to_string())),
            _ => ProcessingStatus::Pending,
        }
    }
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedMedia {
    pub media_id: String,
    pub status: ProcessingStatus,
}

/// Why a publish did not produce a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublishFailure {
    /// Checked before the first attempt; no attempt was consumed.
    Precondition { kind: ErrorKind, message: String },
    /// A non-transient error stopped the retries early.
    Permanent { kind: ErrorKind, message: String },
    /// Every attempt failed with a transient error.
    GaveUp { attempts: u32, message: String },
}

impl PublishFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishFailure::Precondition { kind, .. } | PublishFailure::Permanent { kind, .. } => {
                *kind
            }
            PublishFailure::GaveUp { .. } => ErrorKind::TransientRemote,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PublishFailure::Precondition { message, .. }
            | PublishFailure::Permanent { message, .. }
            | PublishFailure::GaveUp { message, .. } => message,
        }
    }

    pub fn is_give_up(&self) -> bool {
        matches!(self, PublishFailure::GaveUp { .. })
    }
}

/// What happened during one publish call.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub success: bool,
    /// Attempts made; 0 when a precondition failed.
    pub attempts: u32,
    pub backoffs: Vec<RetryAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PublishFailure>,
}
