//! Publish flow: upload, wait for processing, post, all under a retry policy.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::metrics;
use crate::retry::{RetryError, RetryPolicy};

use super::config::PublisherConfig;
use super::error::PublishError;
use super::traits::FeedClient;
use super::types::{ProcessingStatus, PublishFailure, PublishReport};

/// Operation label used in retry logs and metrics.
const OPERATION: &str = "publish";

/// Posts an excerpt to the public feed.
pub struct Publisher {
    feed: Arc<dyn FeedClient>,
    policy: RetryPolicy,
    poll_interval: Duration,
    max_poll_attempts: u32,
}

impl Publisher {
    pub fn new(feed: Arc<dyn FeedClient>, config: &PublisherConfig) -> Self {
        Self {
            feed,
            policy: RetryPolicy::new(config.retry.clone()),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_poll_attempts: config.max_poll_attempts.max(1),
        }
    }

    /// Publish `excerpt` with `caption`.
    ///
    /// Never returns an error: giving up after the last attempt is reported
    /// as [`PublishFailure::GaveUp`] in the report.
    pub async fn publish(&self, excerpt: &Path, caption: &str) -> PublishReport {
        let start = Instant::now();

        if let Err(e) = self.check_preconditions(excerpt).await {
            error!(
                path = %excerpt.display(),
                kind = %e.kind(),
                "Publish precondition failed: {}",
                e
            );
            return self.finish(
                start,
                PublishReport {
                    success: false,
                    attempts: 0,
                    backoffs: Vec::new(),
                    post_id: None,
                    failure: Some(PublishFailure::Precondition {
                        kind: e.kind(),
                        message: e.to_string(),
                    }),
                },
            );
        }

        info!(
            path = %excerpt.display(),
            feed = self.feed.name(),
            max_attempts = self.policy.max_attempts(),
            "Publishing excerpt"
        );

        let outcome = self
            .policy
            .run(OPERATION, |attempt| self.attempt(excerpt, caption, attempt))
            .await;

        let report = match outcome.result {
            Ok(post_id) => {
                info!(post_id = %post_id, attempts = outcome.attempts, "Excerpt published");
                PublishReport {
                    success: true,
                    attempts: outcome.attempts,
                    backoffs: outcome.backoffs,
                    post_id: Some(post_id),
                    failure: None,
                }
            }
            Err(RetryError::Permanent { attempt, error: e }) => {
                error!(attempt = attempt, kind = %e.kind(), "Publish failed: {}", e);
                PublishReport {
                    success: false,
                    attempts: outcome.attempts,
                    backoffs: outcome.backoffs,
                    post_id: None,
                    failure: Some(PublishFailure::Permanent {
                        kind: e.kind(),
                        message: e.to_string(),
                    }),
                }
            }
            Err(RetryError::Exhausted {
                attempts,
                last_error,
            }) => PublishReport {
                success: false,
                attempts: outcome.attempts,
                backoffs: outcome.backoffs,
                post_id: None,
                failure: Some(PublishFailure::GaveUp {
                    attempts,
                    message: last_error.to_string(),
                }),
            },
        };

        self.finish(start, report)
    }

    async fn check_preconditions(&self, excerpt: &Path) -> Result<(), PublishError> {
        if !self.feed.has_credentials() {
            return Err(PublishError::MissingCredentials);
        }
        match tokio::fs::metadata(excerpt).await {
            Ok(meta) if meta.is_file() => Ok(()),
            _ => Err(PublishError::MissingFile(excerpt.to_path_buf())),
        }
    }

    /// One full upload, poll and post cycle.
    async fn attempt(
        &self,
        excerpt: &Path,
        caption: &str,
        attempt: u32,
    ) -> Result<String, PublishError> {
        let uploaded = self.feed.upload_media(excerpt).await?;
        info!(media_id = %uploaded.media_id, attempt = attempt, "Media uploaded, awaiting processing");

        let mut status = uploaded.status;
        let mut polls = 0u32;
        while status == ProcessingStatus::Pending {
            if polls >= self.max_poll_attempts {
                return Err(PublishError::ProcessingStuck { polls });
            }
            info!(
                media_id = %uploaded.media_id,
                wait_secs = self.poll_interval.as_secs(),
                "Media still processing"
            );
            tokio::time::sleep(self.poll_interval).await;
            status = self.feed.media_status(&uploaded.media_id).await?;
            polls += 1;
        }

        if let ProcessingStatus::Failed(reason) = status {
            warn!(media_id = %uploaded.media_id, "Platform rejected media: {}", reason);
            return Err(PublishError::ProcessingFailed(reason));
        }

        self.feed.create_post(caption, &uploaded.media_id).await
    }

    fn finish(&self, start: Instant, report: PublishReport) -> PublishReport {
        let label = match &report.failure {
            None => "success",
            Some(PublishFailure::GaveUp { .. }) => "gave_up",
            Some(PublishFailure::Precondition { .. }) => "precondition",
            Some(PublishFailure::Permanent { .. }) => "failed",
        };
        metrics::PUBLISH_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::retry::RetryConfig;
    use crate::testing::MockFeedClient;
    use tempfile::TempDir;

    fn fast_config() -> PublisherConfig {
        PublisherConfig {
            access_token: "token".to_string(),
            poll_interval_secs: 0,
            max_poll_attempts: 3,
            retry: RetryConfig {
                max_attempts: 3,
                base_delay_ms: 1,
                max_delay_ms: 5,
                ..RetryConfig::default()
            },
            ..PublisherConfig::default()
        }
    }

    fn excerpt_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("excerpt.mp4");
        std::fs::write(&path, b"video").unwrap();
        path
    }

    fn publisher(feed: &MockFeedClient) -> Publisher {
        Publisher::new(Arc::new(feed.clone()), &fast_config())
    }

    fn transient() -> PublishError {
        PublishError::Api {
            status: 503,
            message: "Service Unavailable".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let dir = TempDir::new().unwrap();
        let feed = MockFeedClient::new();

        let report = publisher(&feed).publish(&excerpt_file(&dir), "caption").await;

        assert!(report.success);
        assert_eq!(report.attempts, 1);
        assert!(report.backoffs.is_empty());
        assert!(report.post_id.is_some());
        assert_eq!(feed.recorded_posts().await, vec!["caption".to_string()]);
    }

    #[tokio::test]
    async fn test_two_transient_failures_then_success() {
        let dir = TempDir::new().unwrap();
        let feed = MockFeedClient::new();
        feed.push_upload_error(transient()).await;
        feed.push_upload_error(transient()).await;

        let report = publisher(&feed).publish(&excerpt_file(&dir), "caption").await;

        assert!(report.success);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.backoffs.len(), 2);
        assert_eq!(report.backoffs[0].attempt, 1);
        assert_eq!(report.backoffs[1].attempt, 2);
        assert!(report.backoffs.iter().all(|b| b.delay <= Duration::from_millis(5)));
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let dir = TempDir::new().unwrap();
        let feed = MockFeedClient::new();
        for _ in 0..5 {
            feed.push_upload_error(transient()).await;
        }

        let report = publisher(&feed).publish(&excerpt_file(&dir), "caption").await;

        assert!(!report.success);
        assert_eq!(report.attempts, 3);
        assert_eq!(report.backoffs.len(), 2);
        assert_eq!(feed.upload_count().await, 3);
        let failure = report.failure.unwrap();
        assert!(failure.is_give_up());
    }

    #[tokio::test]
    async fn test_processing_failure_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let feed = MockFeedClient::new();
        feed.set_initial_status(ProcessingStatus::Pending).await;
        feed.push_status(ProcessingStatus::Failed("InvalidMedia".to_string()))
            .await;

        let report = publisher(&feed).publish(&excerpt_file(&dir), "caption").await;

        assert!(!report.success);
        assert_eq!(report.attempts, 1);
        assert!(matches!(
            report.failure,
            Some(PublishFailure::Permanent {
                kind: ErrorKind::Validation,
                ..
            })
        ));
        assert!(feed.recorded_posts().await.is_empty());
    }

    #[tokio::test]
    async fn test_polls_until_ready() {
        let dir = TempDir::new().unwrap();
        let feed = MockFeedClient::new();
        feed.set_initial_status(ProcessingStatus::Pending).await;
        feed.push_status(ProcessingStatus::Pending).await;
        feed.push_status(ProcessingStatus::Ready).await;

        let report = publisher(&feed).publish(&excerpt_file(&dir), "caption").await;

        assert!(report.success);
        assert_eq!(feed.status_checks().await, 2);
    }

    #[tokio::test]
    async fn test_missing_file_fails_fast() {
        let dir = TempDir::new().unwrap();
        let feed = MockFeedClient::new();

        let report = publisher(&feed)
            .publish(&dir.path().join("missing.mp4"), "caption")
            .await;

        assert!(!report.success);
        assert_eq!(report.attempts, 0);
        assert!(matches!(
            report.failure,
            Some(PublishFailure::Precondition {
                kind: ErrorKind::Validation,
                ..
            })
        ));
        assert_eq!(feed.upload_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_fast() {
        let dir = TempDir::new().unwrap();
        let feed = MockFeedClient::new().without_credentials();

        let report = publisher(&feed).publish(&excerpt_file(&dir), "caption").await;

        assert_eq!(report.attempts, 0);
        assert_eq!(
            report.failure.map(|f| f.kind()),
            Some(ErrorKind::Configuration)
        );
        assert_eq!(feed.upload_count().await, 0);
    }
}
