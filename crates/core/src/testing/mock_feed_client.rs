//! Mock feed client for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::publisher::{FeedClient, ProcessingStatus, PublishError, UploadedMedia};

/// Mock implementation of the FeedClient trait.
///
/// Upload errors are queued and consumed one per upload, which makes it easy
/// to script "fail twice then succeed". Processing statuses are queued the
/// same way; an empty queue reports [`ProcessingStatus::Ready`].
#[derive(Debug, Clone)]
pub struct MockFeedClient {
    credentials: bool,
    upload_errors: Arc<RwLock<VecDeque<PublishError>>>,
    initial_status: Arc<RwLock<ProcessingStatus>>,
    statuses: Arc<RwLock<VecDeque<ProcessingStatus>>>,
    uploads: Arc<RwLock<u32>>,
    status_checks: Arc<RwLock<u32>>,
    posts: Arc<RwLock<Vec<String>>>,
}

impl Default for MockFeedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFeedClient {
    pub fn new() -> Self {
        Self {
            credentials: true,
            upload_errors: Arc::new(RwLock::new(VecDeque::new())),
            initial_status: Arc::new(RwLock::new(ProcessingStatus::Ready)),
            statuses: Arc::new(RwLock::new(VecDeque::new())),
            uploads: Arc::new(RwLock::new(0)),
            status_checks: Arc::new(RwLock::new(0)),
            posts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Report missing credentials.
    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    /// Queue an error for an upcoming upload.
    pub async fn push_upload_error(&self, error: PublishError) {
        self.upload_errors.write().await.push_back(error);
    }

    /// Status returned by every successful upload.
    pub async fn set_initial_status(&self, status: ProcessingStatus) {
        *self.initial_status.write().await = status;
    }

    /// Queue a status for an upcoming status check.
    pub async fn push_status(&self, status: ProcessingStatus) {
        self.statuses.write().await.push_back(status);
    }

    /// Upload attempts, failed ones included.
    pub async fn upload_count(&self) -> u32 {
        *self.uploads.read().await
    }

    pub async fn status_checks(&self) -> u32 {
        *self.status_checks.read().await
    }

    /// Captions of created posts.
    pub async fn recorded_posts(&self) -> Vec<String> {
        self.posts.read().await.clone()
    }
}

#[async_trait]
impl FeedClient for MockFeedClient {
    fn name(&self) -> &str {
        "mock"
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn upload_media(&self, path: &Path) -> Result<UploadedMedia, PublishError> {
        let upload = {
            let mut uploads = self.uploads.write().await;
            *uploads += 1;
            *uploads
        };

        if let Some(e) = self.upload_errors.write().await.pop_front() {
            return Err(e);
        }
        if !path.exists() {
            return Err(PublishError::MissingFile(path.to_path_buf()));
        }

        Ok(UploadedMedia {
            media_id: format!("media-{}", upload),
            status: self.initial_status.read().await.clone(),
        })
    }

    async fn media_status(&self, _media_id: &str) -> Result<ProcessingStatus, PublishError> {
        *self.status_checks.write().await += 1;
        Ok(self
            .statuses
            .write()
            .await
            .pop_front()
            .unwrap_or(ProcessingStatus::Ready))
    }

    async fn create_post(&self, text: &str, _media_id: &str) -> Result<String, PublishError> {
        let mut posts = self.posts.write().await;
        posts.push(text.to_string());
        Ok(format!("post-{}", posts.len()))
    }
}
