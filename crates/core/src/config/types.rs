use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::excerpt::ExcerptConfig;
use crate::publisher::PublisherConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub staging: StagingConfig,
    pub catalog: CatalogConfig,
    pub cache: CacheConfig,
    pub distributor: TelegramConfig,
    #[serde(default)]
    pub excerpt: ExcerptConfig,
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Local staging folder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StagingConfig {
    #[serde(default = "default_staging_dir")]
    pub dir: PathBuf,
    /// Extensions the distribution sweep picks up (lowercase, no dot).
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,
    /// Extensions eligible as excerpt sources.
    #[serde(default = "default_excerpt_extensions")]
    pub excerpt_extensions: Vec<String>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: default_staging_dir(),
            media_extensions: default_media_extensions(),
            excerpt_extensions: default_excerpt_extensions(),
        }
    }
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("staging")
}

fn default_media_extensions() -> Vec<String> {
    ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_excerpt_extensions() -> Vec<String> {
    ["mp4", "mov", "mkv"].iter().map(|s| s.to_string()).collect()
}

/// Remote catalog (Google Drive v3) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// API base URL (e.g., "https://www.googleapis.com")
    #[serde(default = "default_catalog_url")]
    pub api_url: String,
    /// Folder whose videos make up the catalog
    #[serde(default)]
    pub folder_id: String,
    /// OAuth access token, acquired outside this process
    #[serde(default)]
    pub access_token: String,
    /// Name prefix marking paid assets
    #[serde(default = "default_paid_prefix")]
    pub paid_prefix: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u32,
    /// Page size for listing
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Progress reporting granularity for downloads
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,
}

fn default_catalog_url() -> String {
    "https://www.googleapis.com".to_string()
}

pub(crate) fn default_paid_prefix() -> String {
    "paid_".to_string()
}

fn default_catalog_timeout() -> u32 {
    30
}

fn default_page_size() -> u32 {
    100
}

fn default_chunk_size() -> u64 {
    1024 * 1024
}

/// Dedup cache (Redis) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_host")]
    pub host: String,
    #[serde(default = "default_cache_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Text written in front of the date in cache markers
    #[serde(default = "default_marker_prefix")]
    pub marker_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: default_cache_host(),
            port: default_cache_port(),
            db: 0,
            username: String::new(),
            password: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            marker_prefix: default_marker_prefix(),
        }
    }
}

fn default_cache_host() -> String {
    "127.0.0.1".to_string()
}

fn default_cache_port() -> u16 {
    6379
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_marker_prefix() -> String {
    "Downloaded on".to_string()
}

/// Distribution channel (Telegram Bot API) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    /// Bot API base URL; point this at a local Bot API server for large uploads
    #[serde(default = "default_telegram_url")]
    pub api_url: String,
    #[serde(default)]
    pub bot_token: String,
    /// Group that receives every distributed asset
    #[serde(default)]
    pub group_chat_id: String,
    /// Channel that hosts paid media (required only for paid assets)
    #[serde(default)]
    pub paid_channel_chat_id: Option<String>,
    /// Caption attached to distributed videos
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u32,
    /// Name prefix marking paid assets
    #[serde(default = "default_paid_prefix")]
    pub paid_prefix: String,
}

fn default_telegram_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Upload ceiling of the cloud Bot API. A local Bot API server allows up to 2000.
fn default_max_upload_mb() -> u64 {
    50
}

fn default_telegram_timeout() -> u32 {
    600
}

/// Metrics output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Prometheus textfile written at the end of a run
    #[serde(default)]
    pub textfile_path: Option<PathBuf>,
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub staging: StagingConfig,
    pub catalog: SanitizedCatalogConfig,
    pub cache: SanitizedCacheConfig,
    pub distributor: SanitizedTelegramConfig,
    pub excerpt: ExcerptConfig,
    pub publisher: SanitizedPublisherConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCatalogConfig {
    pub api_url: String,
    pub folder_id: String,
    pub access_token_configured: bool,
    pub paid_prefix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCacheConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub credentials_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTelegramConfig {
    pub api_url: String,
    pub bot_token_configured: bool,
    pub group_chat_id: String,
    pub paid_channel_configured: bool,
    pub max_upload_mb: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPublisherConfig {
    pub api_url: String,
    pub access_token_configured: bool,
    pub poll_interval_secs: u64,
    pub max_attempts: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            staging: config.staging.clone(),
            catalog: SanitizedCatalogConfig {
                api_url: config.catalog.api_url.clone(),
                folder_id: config.catalog.folder_id.clone(),
                access_token_configured: !config.catalog.access_token.is_empty(),
                paid_prefix: config.catalog.paid_prefix.clone(),
            },
            cache: SanitizedCacheConfig {
                host: config.cache.host.clone(),
                port: config.cache.port,
                db: config.cache.db,
                credentials_configured: !config.cache.username.is_empty()
                    && !config.cache.password.is_empty(),
            },
            distributor: SanitizedTelegramConfig {
                api_url: config.distributor.api_url.clone(),
                bot_token_configured: !config.distributor.bot_token.is_empty(),
                group_chat_id: config.distributor.group_chat_id.clone(),
                paid_channel_configured: config.distributor.paid_channel_chat_id.is_some(),
                max_upload_mb: config.distributor.max_upload_mb,
            },
            excerpt: config.excerpt.clone(),
            publisher: SanitizedPublisherConfig {
                api_url: config.publisher.api_url.clone(),
                access_token_configured: !config.publisher.access_token.is_empty(),
                poll_interval_secs: config.publisher.poll_interval_secs,
                max_attempts: config.publisher.retry.max_attempts,
            },
            metrics: config.metrics.clone(),
        }
    }
}
