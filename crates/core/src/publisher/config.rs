//! Configuration for the publisher module.

use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Placeholder replaced by the configured link in the caption template.
pub const LINK_PLACEHOLDER: &str = "{link}";

/// Public feed (X API v2) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// API base URL (e.g., "https://api.x.com")
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// OAuth 2.0 user access token, acquired outside this process
    #[serde(default)]
    pub access_token: String,

    /// Post text; `{link}` is replaced with `link`
    #[serde(default = "default_caption_template")]
    pub caption_template: String,

    /// Link advertised in the post (channel or group invite)
    #[serde(default)]
    pub link: String,

    /// Seconds between processing-status checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Status checks before an upload is considered stuck
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    #[serde(default = "default_upload_chunk")]
    pub upload_chunk_bytes: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_api_url() -> String {
    "https://api.x.com".to_string()
}

fn default_caption_template() -> String {
    "New video posted! 🔥\n\nWatch the full video and much more on our channel: {link}".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_max_poll_attempts() -> u32 {
    60
}

fn default_upload_chunk() -> u64 {
    4 * 1024 * 1024
}

fn default_timeout() -> u64 {
    120
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            access_token: String::new(),
            caption_template: default_caption_template(),
            link: String::new(),
            poll_interval_secs: default_poll_interval(),
            max_poll_attempts: default_max_poll_attempts(),
            upload_chunk_bytes: default_upload_chunk(),
            timeout_secs: default_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl PublisherConfig {
    /// Post text with the link filled in.
    pub fn build_caption(&self) -> String {
        self.caption_template
            .replace(LINK_PLACEHOLDER, &self.link)
            .trim_end()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: PublisherConfig = toml::from_str("poll_interval_secs = 5").unwrap();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.api_url, "https://api.x.com");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.upload_chunk_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn test_build_caption() {
        let config = PublisherConfig {
            caption_template: "Full video: {link}".to_string(),
            link: "https://t.me/example".to_string(),
            ..PublisherConfig::default()
        };
        assert_eq!(config.build_caption(), "Full video: https://t.me/example");

        let no_link = PublisherConfig {
            caption_template: "Watch: {link}".to_string(),
            ..PublisherConfig::default()
        };
        assert_eq!(no_link.build_caption(), "Watch:");
    }
}
