//! Types for the run orchestrator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{Asset, AssetTag, CatalogError};
use crate::distributor::SweepReport;
use crate::error::ErrorKind;
use crate::excerpt::ExcerptReport;
use crate::fetcher::StagedFile;
use crate::publisher::PublishReport;

/// Errors that abort a run before anything is staged.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Listing the catalog failed for a reason other than a missing folder.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The staging folder could not be prepared.
    #[error("staging folder {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OrchestratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::Catalog(e) => e.kind(),
            OrchestratorError::Staging { .. } => ErrorKind::Configuration,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The catalog had nothing eligible for the tier.
    NothingToDo,
    /// Everything ran, including the public post when an excerpt was made.
    Completed,
    /// The source was too short for an excerpt and was discarded.
    ExcerptIgnored,
    /// Probing or trimming failed; the source stays staged.
    ExcerptFailed,
    /// The excerpt could not be posted; the source stays staged.
    PublishFailed,
    /// The selected asset could not be downloaded.
    FetchFailed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::NothingToDo => "nothing_to_do",
            RunStatus::Completed => "completed",
            RunStatus::ExcerptIgnored => "excerpt_ignored",
            RunStatus::ExcerptFailed => "excerpt_failed",
            RunStatus::PublishFailed => "publish_failed",
            RunStatus::FetchFailed => "fetch_failed",
        }
    }

    /// Whether the run left work undone that needs attention.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RunStatus::ExcerptFailed | RunStatus::PublishFailed | RunStatus::FetchFailed
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one run did, for logging and the exit status.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub tier: AssetTag,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Eligible assets left after filtering by tag and cache.
    pub pool_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<Asset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged: Option<StagedFile>,
    /// Whether the processed marker made it into the cache.
    pub cache_recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<SweepReport>,
    /// Staged file chosen as excerpt source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt_source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<ExcerptReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishReport>,
    pub source_removed: bool,
    pub excerpt_removed: bool,
}

impl RunReport {
    pub(crate) fn new(run_id: String, tier: AssetTag) -> Self {
        Self {
            run_id,
            tier,
            status: RunStatus::NothingToDo,
            started_at: Utc::now(),
            finished_at: Utc::now(),
            pool_size: 0,
            selected: None,
            staged: None,
            cache_recorded: false,
            distribution: None,
            excerpt_source: None,
            excerpt: None,
            publish: None,
            source_removed: false,
            excerpt_removed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_failure() {
        assert!(!RunStatus::NothingToDo.is_failure());
        assert!(!RunStatus::Completed.is_failure());
        assert!(!RunStatus::ExcerptIgnored.is_failure());
        assert!(RunStatus::ExcerptFailed.is_failure());
        assert!(RunStatus::PublishFailed.is_failure());
        assert!(RunStatus::FetchFailed.is_failure());
    }

    #[test]
    fn test_run_report_serialization() {
        let mut report = RunReport::new("run-1".to_string(), AssetTag::Free);
        report.status = RunStatus::ExcerptIgnored;

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "excerpt_ignored");
        assert_eq!(json["tier"], "free");
        assert!(json.get("selected").is_none());
    }

    #[test]
    fn test_error_kind() {
        let err = OrchestratorError::Staging {
            path: PathBuf::from("/staging"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().starts_with("staging folder /staging"));
    }
}
