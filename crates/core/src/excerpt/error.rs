//! Error types for the excerpt module.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorKind;

/// Errors from probing or trimming a media file.
#[derive(Debug, Error)]
pub enum ExcerptError {
    #[error("FFmpeg not found at path: {}", .path.display())]
    FfmpegNotFound { path: PathBuf },

    #[error("FFprobe not found at path: {}", .path.display())]
    FfprobeNotFound { path: PathBuf },

    #[error("Input file not found: {}", .path.display())]
    InputNotFound { path: PathBuf },

    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// ffprobe ran but reported no usable duration.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    #[error("Trim failed: {reason}")]
    TrimFailed {
        reason: String,
        stderr: Option<String>,
    },

    #[error("Trim timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExcerptError {
    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    pub fn trim_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::TrimFailed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputNotFound { .. } => ErrorKind::Validation,
            _ => ErrorKind::ToolFailure,
        }
    }

    /// Diagnostic output captured from the tool, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::TrimFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
