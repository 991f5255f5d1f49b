//! Trait definitions for the publisher module.

use async_trait::async_trait;
use std::path::Path;

use super::error::PublishError;
use super::types::{ProcessingStatus, UploadedMedia};

/// A public feed that accepts video posts.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Returns the name of this feed implementation.
    fn name(&self) -> &str;

    /// Whether every credential needed to post is present.
    fn has_credentials(&self) -> bool;

    /// Upload a media file in chunks.
    async fn upload_media(&self, path: &Path) -> Result<UploadedMedia, PublishError>;

    /// Current processing status of uploaded media.
    async fn media_status(&self, media_id: &str) -> Result<ProcessingStatus, PublishError>;

    /// Create a post referencing `media_id`. Returns the post id.
    async fn create_post(&self, text: &str, media_id: &str) -> Result<String, PublishError>;
}
