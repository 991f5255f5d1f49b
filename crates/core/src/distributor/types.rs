use std::path::Path;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// What the channel returned for a delivered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Message id in the chat the file was posted to.
    pub message_id: i64,
    /// Chat the file was posted to.
    pub chat_id: String,
    /// Star price, for paid media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_stars: Option<u32>,
}

/// Whether `path` has one of `extensions` (lowercase, no dot), case-insensitively.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| extensions.iter().any(|allowed| *allowed == ext))
}

/// Star price encoded in a paid file name as `<prefix><stars>_...`.
///
/// Returns `None` for free files, including names that carry the prefix
/// without a number.
pub fn paid_star_count(file_name: &str, paid_prefix: &str) -> Option<u32> {
    if paid_prefix.is_empty() {
        return None;
    }
    let pattern = format!(r"^{}(\d+)_", regex_lite::escape(paid_prefix));
    let re = Regex::new(&pattern).ok()?;
    re.captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        vec!["mp4".to_string(), "mkv".to_string()]
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/clip.mp4"), &exts()));
        assert!(has_extension(Path::new("CLIP.MKV"), &exts()));
        assert!(!has_extension(Path::new("clip.mp4.part"), &exts()));
        assert!(!has_extension(Path::new("notes.txt"), &exts()));
        assert!(!has_extension(Path::new("noext"), &exts()));
    }

    #[test]
    fn test_paid_star_count() {
        assert_eq!(paid_star_count("paid_50_intro.mp4", "paid_"), Some(50));
        assert_eq!(paid_star_count("paid_intro.mp4", "paid_"), None);
        assert_eq!(paid_star_count("intro_paid_50_.mp4", "paid_"), None);
        assert_eq!(paid_star_count("vip.5_x.mp4", "vip."), Some(5));
        assert_eq!(paid_star_count("vipX5_x.mp4", "vip."), None);
    }
}
