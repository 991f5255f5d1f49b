//! Types for the excerpt module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::ErrorKind;

/// The part of the source that becomes the excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcerptWindow {
    pub start_offset_secs: u64,
    pub duration_secs: u64,
}

impl ExcerptWindow {
    pub fn new(start_offset_secs: u64, duration_secs: u64) -> Self {
        Self {
            start_offset_secs,
            duration_secs,
        }
    }

    /// Source second at which the excerpt ends.
    pub fn end_secs(&self) -> u64 {
        self.start_offset_secs + self.duration_secs
    }
}

impl Default for ExcerptWindow {
    fn default() -> Self {
        Self::new(120, 120)
    }
}

/// A derived clip on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Excerpt {
    pub path: PathBuf,
    pub start_offset_secs: u64,
    pub duration_secs: u64,
}

/// Where the derivation of one source stands.
///
/// `Probing` leads to `Eligible`, `TooShort` or `ProbeFailed`; `Eligible`
/// leads to `Trimmed` or `TrimFailed`. Every other state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcerptState {
    Probing,
    Eligible,
    TooShort,
    ProbeFailed,
    Trimmed,
    TrimFailed,
}

impl ExcerptState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExcerptState::Probing | ExcerptState::Eligible)
    }

    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: ExcerptState) -> bool {
        use ExcerptState::*;
        matches!(
            (self, next),
            (Probing, Eligible)
                | (Probing, TooShort)
                | (Probing, ProbeFailed)
                | (Eligible, Trimmed)
                | (Eligible, TrimFailed)
        )
    }

    /// Outcome reported for a terminal state.
    pub fn outcome(&self) -> Option<ExcerptOutcome> {
        match self {
            ExcerptState::Trimmed => Some(ExcerptOutcome::Success),
            ExcerptState::TooShort => Some(ExcerptOutcome::Ignored),
            ExcerptState::ProbeFailed | ExcerptState::TrimFailed => Some(ExcerptOutcome::Error),
            ExcerptState::Probing | ExcerptState::Eligible => None,
        }
    }
}

impl fmt::Display for ExcerptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExcerptState::Probing => "probing",
            ExcerptState::Eligible => "eligible",
            ExcerptState::TooShort => "too_short",
            ExcerptState::ProbeFailed => "probe_failed",
            ExcerptState::Trimmed => "trimmed",
            ExcerptState::TrimFailed => "trim_failed",
        };
        f.write_str(s)
    }
}

/// Three-way result of an excerpt derivation.
///
/// `Ignored` and `Error` lead to different cleanup, so this never collapses
/// to a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcerptOutcome {
    Success,
    Ignored,
    Error,
}

impl ExcerptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcerptOutcome::Success => "success",
            ExcerptOutcome::Ignored => "ignored",
            ExcerptOutcome::Error => "error",
        }
    }
}

impl fmt::Display for ExcerptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine knows after deriving one excerpt.
#[derive(Debug, Clone, Serialize)]
pub struct ExcerptReport {
    pub state: ExcerptState,
    pub outcome: ExcerptOutcome,
    /// Probed source duration, when probing succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_duration_secs: Option<f64>,
    /// Set only for `Success`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<Excerpt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Decide from the probed duration whether a source can be excerpted.
///
/// Returns `Eligible` or `TooShort`.
pub fn classify_duration(duration_secs: f64, min_source_secs: u64) -> ExcerptState {
    if duration_secs < min_source_secs as f64 {
        ExcerptState::TooShort
    } else {
        ExcerptState::Eligible
    }
}
