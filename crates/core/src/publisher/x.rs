//! X API v2 feed client.

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use super::config::PublisherConfig;
use super::error::PublishError;
use super::traits::FeedClient;
use super::types::{ProcessingStatus, UploadedMedia};

/// Posts videos through the v2 media upload and tweets endpoints.
pub struct XFeedClient {
    client: Client,
    base_url: String,
    access_token: String,
    chunk_bytes: u64,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct MediaData {
    id: String,
    #[serde(default)]
    processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessingInfo {
    state: String,
    #[serde(default)]
    error: Option<ProcessingErrorInfo>,
}

#[derive(Debug, Deserialize)]
struct ProcessingErrorInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
}

impl ProcessingInfo {
    fn into_status(self) -> ProcessingStatus {
        let error = self.error.and_then(|e| e.message.or(e.name));
        ProcessingStatus::from_state(&self.state, error)
    }
}

impl MediaData {
    /// Media without processing info needs no processing.
    fn status(self) -> (String, ProcessingStatus) {
        let status = self
            .processing_info
            .map(ProcessingInfo::into_status)
            .unwrap_or(ProcessingStatus::Ready);
        (self.id, status)
    }
}

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        _ => "video/mp4",
    }
}

impl XFeedClient {
    pub fn new(config: &PublisherConfig) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            chunk_bytes: config.upload_chunk_bytes.max(1),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PublishError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| PublishError::Parse(e.to_string()))?;
        Ok(envelope.data)
    }

    async fn initialize(&self, total_bytes: u64, media_type: &str) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/2/media/upload/initialize", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "media_type": media_type,
                "total_bytes": total_bytes,
                "media_category": "tweet_video",
            }))
            .send()
            .await?;

        let data: MediaData = Self::read_json(response).await?;
        Ok(data.id)
    }

    async fn append(&self, media_id: &str, segment: u32, chunk: Vec<u8>) -> Result<(), PublishError> {
        let form = multipart::Form::new()
            .text("segment_index", segment.to_string())
            .part("media", multipart::Part::bytes(chunk).file_name("chunk"));

        let response = self
            .client
            .post(format!("{}/2/media/upload/{}/append", self.base_url, media_id))
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    async fn finalize(&self, media_id: &str) -> Result<ProcessingStatus, PublishError> {
        let response = self
            .client
            .post(format!("{}/2/media/upload/{}/finalize", self.base_url, media_id))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let data: MediaData = Self::read_json(response).await?;
        Ok(data.status().1)
    }
}

#[async_trait]
impl FeedClient for XFeedClient {
    fn name(&self) -> &str {
        "x"
    }

    fn has_credentials(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    async fn upload_media(&self, path: &Path) -> Result<UploadedMedia, PublishError> {
        let total_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|_| PublishError::MissingFile(path.to_path_buf()))?
            .len();
        let media_type = media_type_for(path);

        let media_id = self.initialize(total_bytes, media_type).await?;
        debug!(media_id = %media_id, total_bytes = total_bytes, "Upload initialized");

        let mut file = tokio::fs::File::open(path).await?;
        let mut segment = 0u32;
        loop {
            let mut chunk = Vec::with_capacity(self.chunk_bytes as usize);
            let read = (&mut file).take(self.chunk_bytes).read_to_end(&mut chunk).await?;
            if read == 0 {
                break;
            }
            self.append(&media_id, segment, chunk).await?;
            segment += 1;
        }

        let status = self.finalize(&media_id).await?;
        info!(
            media_id = %media_id,
            segments = segment,
            status = ?status,
            "Media upload finalized"
        );

        Ok(UploadedMedia { media_id, status })
    }

    async fn media_status(&self, media_id: &str) -> Result<ProcessingStatus, PublishError> {
        let response = self
            .client
            .get(format!("{}/2/media/upload", self.base_url))
            .bearer_auth(&self.access_token)
            .query(&[("command", "STATUS"), ("media_id", media_id)])
            .send()
            .await?;

        let data: MediaData = Self::read_json(response).await?;
        Ok(data.status().1)
    }

    async fn create_post(&self, text: &str, media_id: &str) -> Result<String, PublishError> {
        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "text": text,
                "media": { "media_ids": [media_id] },
            }))
            .send()
            .await?;

        let post: PostData = Self::read_json(response).await?;
        Ok(post.id)
    }
}
