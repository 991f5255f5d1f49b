//! Telegram Bot API distributor.
//!
//! Free files go to the group with `sendVideo`. Paid files (name prefixed
//! with `paid_<stars>_`) are posted to the paid channel with `sendPaidMedia`
//! and then forwarded to the group. With previews enabled, a short cut of a
//! paid file is posted to the group ahead of the forward.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Body, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TelegramConfig;
use crate::excerpt::{ExcerptEngine, ExcerptOutcome};
use crate::fetcher::StagedFile;

use super::error::DistributeError;
use super::traits::Distributor;
use super::types::{paid_star_count, DeliveryReceipt};

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

/// Folder next to the staged file where previews are cut. Not swept.
const PREVIEW_SUBDIR: &str = "previews";

fn preview_caption(stars: u32) -> String {
    format!(
        "👀 Preview of exclusive content ({} ⭐️)\n\nGet the full video below! 👇",
        stars
    )
}

pub struct TelegramDistributor {
    client: Client,
    base_url: String,
    group_chat_id: String,
    paid_channel_chat_id: Option<String>,
    paid_prefix: String,
    max_upload_bytes: u64,
    max_upload_mb: u64,
    previews: Option<ExcerptEngine>,
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct MessageId {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(default)]
    title: Option<String>,
}

impl TelegramDistributor {
    pub fn new(config: &TelegramConfig) -> Result<Self, DistributeError> {
        if config.bot_token.is_empty() {
            return Err(DistributeError::NotConfigured(
                "bot token is required".to_string(),
            ));
        }
        if config.group_chat_id.is_empty() {
            return Err(DistributeError::NotConfigured(
                "group chat id is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.bot_token
            ),
            group_chat_id: config.group_chat_id.clone(),
            paid_channel_chat_id: config.paid_channel_chat_id.clone().filter(|c| !c.is_empty()),
            paid_prefix: config.paid_prefix.clone(),
            max_upload_bytes: config.max_upload_mb.saturating_mul(1024 * 1024),
            max_upload_mb: config.max_upload_mb,
            previews: None,
        })
    }

    /// Post a preview cut by `engine` to the group for every paid file.
    pub fn with_previews(mut self, engine: ExcerptEngine) -> Self {
        self.previews = Some(engine);
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Decode a Bot API envelope, turning `ok: false` into an API error.
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DistributeError> {
        let status = response.status().as_u16();
        let body = response.text().await?;

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            if status >= 400 {
                DistributeError::Api {
                    status,
                    description: body.clone(),
                }
            } else {
                DistributeError::Parse(e.to_string())
            }
        })?;

        if !envelope.ok {
            return Err(DistributeError::Api {
                status: envelope.error_code.unwrap_or(status),
                description: envelope.description.unwrap_or_default(),
            });
        }

        envelope
            .result
            .ok_or_else(|| DistributeError::Parse("response without result".to_string()))
    }

    async fn call_json<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, DistributeError> {
        let response = self
            .client
            .post(self.url(method))
            .json(payload)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn call_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        form: multipart::Form,
    ) -> Result<T, DistributeError> {
        let response = self
            .client
            .post(self.url(method))
            .multipart(form)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Local checks done before any upload: type, existence and size.
    async fn check_file(&self, path: &Path) -> Result<u64, DistributeError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if !VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            return Err(DistributeError::UnsupportedType(format!(".{}", ext)));
        }

        let meta = match tokio::fs::metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DistributeError::MissingFile(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if meta.len() > self.max_upload_bytes {
            return Err(DistributeError::TooLarge {
                size_mb: meta.len() / (1024 * 1024),
                limit_mb: self.max_upload_mb,
            });
        }

        Ok(meta.len())
    }

    async fn video_part(path: &Path, len: u64) -> Result<multipart::Part, DistributeError> {
        let file = tokio::fs::File::open(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());

        multipart::Part::stream_with_length(Body::from(file), len)
            .file_name(file_name)
            .mime_str("video/mp4")
            .map_err(|e| DistributeError::Parse(e.to_string()))
    }

    async fn send_free(
        &self,
        path: &Path,
        len: u64,
        caption: Option<&str>,
    ) -> Result<DeliveryReceipt, DistributeError> {
        let mut form = multipart::Form::new()
            .text("chat_id", self.group_chat_id.clone())
            .text("supports_streaming", "true")
            .part("video", Self::video_part(path, len).await?);
        if let Some(caption) = caption.filter(|c| !c.is_empty()) {
            form = form.text("caption", caption.to_string());
        }

        let message: Message = self.call_multipart("sendVideo", form).await?;

        Ok(DeliveryReceipt {
            message_id: message.message_id,
            chat_id: self.group_chat_id.clone(),
            paid_stars: None,
        })
    }

    async fn send_paid(
        &self,
        path: &Path,
        len: u64,
        stars: u32,
        caption: Option<&str>,
    ) -> Result<DeliveryReceipt, DistributeError> {
        let channel = self.paid_channel_chat_id.clone().ok_or_else(|| {
            DistributeError::NotConfigured("paid channel chat id is required for paid media".to_string())
        })?;

        let media = serde_json::json!([{
            "type": "video",
            "media": "attach://video",
            "supports_streaming": true,
        }]);

        let mut form = multipart::Form::new()
            .text("chat_id", channel.clone())
            .text("star_count", stars.to_string())
            .text("media", media.to_string())
            .part("video", Self::video_part(path, len).await?);
        if let Some(caption) = caption.filter(|c| !c.is_empty()) {
            form = form.text("caption", caption.to_string());
        }

        let message: Message = self.call_multipart("sendPaidMedia", form).await?;
        info!(
            channel = %channel,
            message_id = message.message_id,
            stars = stars,
            "Paid media posted to channel"
        );

        self.post_preview(path, stars).await;

        // The channel post is the delivery; forwarding only advertises it.
        let forward = serde_json::json!({
            "chat_id": self.group_chat_id,
            "from_chat_id": channel,
            "message_id": message.message_id,
        });
        match self.call_json::<MessageId>("forwardMessage", &forward).await {
            Ok(fwd) => debug!(message_id = fwd.message_id, "Paid media forwarded to group"),
            Err(e) => warn!(group = %self.group_chat_id, "Failed to forward paid media: {}", e),
        }

        Ok(DeliveryReceipt {
            message_id: message.message_id,
            chat_id: channel,
            paid_stars: Some(stars),
        })
    }

    /// Cut a preview of `source` and post it to the group.
    ///
    /// Best effort: every failure is logged and the preview file is always
    /// removed afterwards.
    async fn post_preview(&self, source: &Path, stars: u32) {
        let Some(engine) = &self.previews else {
            return;
        };

        let preview = preview_path(source);
        let report = engine.derive(source, &preview).await;

        match report.outcome {
            ExcerptOutcome::Success => {
                let caption = preview_caption(stars);
                let sent = match tokio::fs::metadata(&preview).await {
                    Ok(meta) => self.send_free(&preview, meta.len(), Some(&caption)).await,
                    Err(e) => Err(e.into()),
                };
                match sent {
                    Ok(receipt) => info!(
                        message_id = receipt.message_id,
                        group = %self.group_chat_id,
                        "Paid media preview posted to group"
                    ),
                    Err(e) => warn!(kind = %e.kind(), "Failed to post paid media preview: {}", e),
                }
            }
            outcome => warn!(
                outcome = outcome.as_str(),
                error = report.error.as_deref().unwrap_or(""),
                "No preview for paid media"
            ),
        }

        match tokio::fs::remove_file(&preview).await {
            Ok(()) => debug!(path = %preview.display(), "Preview removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %preview.display(), "Failed to remove preview: {}", e),
        }
    }
}

fn preview_path(source: &Path) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let suffix = Uuid::new_v4().simple().to_string();
    dir.join(PREVIEW_SUBDIR)
        .join(format!("preview-paid-{}.mp4", &suffix[..8]))
}

#[async_trait]
impl Distributor for TelegramDistributor {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn validate(&self) -> Result<(), DistributeError> {
        let me: User = self.call_json("getMe", &serde_json::json!({})).await?;
        info!(bot = ?me.username, "Channel session valid");

        let mut chats = vec![self.group_chat_id.clone()];
        chats.extend(self.paid_channel_chat_id.clone());

        for chat_id in chats {
            let chat: Chat = self
                .call_json("getChat", &serde_json::json!({ "chat_id": chat_id }))
                .await?;
            debug!(chat_id = chat.id, title = ?chat.title, "Chat reachable");
        }

        Ok(())
    }

    async fn publish(
        &self,
        file: &StagedFile,
        caption: Option<&str>,
    ) -> Result<DeliveryReceipt, DistributeError> {
        let len = self.check_file(&file.path).await?;
        let name = file.file_name();

        info!(
            file = %name,
            size_mb = len / (1024 * 1024),
            "Uploading to channel"
        );

        let receipt = match paid_star_count(&name, &self.paid_prefix) {
            Some(stars) => self.send_paid(&file.path, len, stars, caption).await?,
            None => self.send_free(&file.path, len, caption).await?,
        };

        info!(
            file = %name,
            chat = %receipt.chat_id,
            message_id = receipt.message_id,
            "Delivered to channel"
        );
        Ok(receipt)
    }
}
