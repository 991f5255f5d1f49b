//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;

/// Name of the folder inside staging that holds excerpts while they are posted.
///
/// Excerpts live one level down so the distribution sweep never sees them.
pub const EXCERPT_SUBDIR: &str = "excerpts";

/// What a run needs to know beyond its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Catalog folder to list.
    pub folder_id: String,
    /// Local staging folder.
    pub staging_dir: PathBuf,
    /// Extensions the distribution sweep picks up.
    pub media_extensions: Vec<String>,
    /// Extensions eligible as excerpt sources.
    pub excerpt_extensions: Vec<String>,
    /// Text in front of the date in cache markers.
    pub marker_prefix: String,
    /// Caption for files pushed into the distribution channel.
    #[serde(default)]
    pub distribution_caption: Option<String>,
    /// Text of the public post.
    pub post_caption: String,
}

impl OrchestratorConfig {
    pub fn excerpt_dir(&self) -> PathBuf {
        self.staging_dir.join(EXCERPT_SUBDIR)
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            folder_id: config.catalog.folder_id.clone(),
            staging_dir: config.staging.dir.clone(),
            media_extensions: config.staging.media_extensions.clone(),
            excerpt_extensions: config.staging.excerpt_extensions.clone(),
            marker_prefix: config.cache.marker_prefix.clone(),
            distribution_caption: config.distributor.caption.clone(),
            post_caption: config.publisher.build_caption(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_from_config() {
        let config = load_config_from_str(
            r#"
[staging]
dir = "/var/lib/reelcast"

[catalog]
folder_id = "folder-1"
access_token = "t"

[cache]
username = "u"
password = "p"

[distributor]
bot_token = "1:x"
group_chat_id = "@g"
caption = "New drop"

[publisher]
access_token = "x"
caption_template = "Watch more at {link}"
link = "https://t.me/g"
"#,
        )
        .unwrap();

        let orch = OrchestratorConfig::from(&config);
        assert_eq!(orch.folder_id, "folder-1");
        assert_eq!(orch.excerpt_dir(), PathBuf::from("/var/lib/reelcast/excerpts"));
        assert_eq!(orch.marker_prefix, "Downloaded on");
        assert_eq!(orch.distribution_caption.as_deref(), Some("New drop"));
        assert_eq!(orch.post_caption, "Watch more at https://t.me/g");
    }
}
