//! Configuration for the excerpt module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Excerpt window and encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcerptConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Where the excerpt starts in the source, in seconds.
    #[serde(default = "default_start_offset")]
    pub start_offset_secs: u64,

    /// Excerpt length in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Sources shorter than this are not excerpted.
    #[serde(default = "default_min_source")]
    pub min_source_secs: u64,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// x264 preset (ultrafast .. veryslow).
    #[serde(default = "default_preset")]
    pub preset: String,

    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Timeout for a single trim in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_start_offset() -> u64 {
    120
}

fn default_duration() -> u64 {
    120
}

fn default_min_source() -> u64 {
    300
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_timeout() -> u64 {
    1800 // 30 minutes
}

impl Default for ExcerptConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            start_offset_secs: default_start_offset(),
            duration_secs: default_duration(),
            min_source_secs: default_min_source(),
            video_codec: default_video_codec(),
            preset: default_preset(),
            crf: default_crf(),
            audio_codec: default_audio_codec(),
            timeout_secs: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_section() {
        let config: ExcerptConfig = toml::from_str("").unwrap();
        assert_eq!(config.start_offset_secs, 120);
        assert_eq!(config.duration_secs, 120);
        assert_eq!(config.min_source_secs, 300);
        assert_eq!(config.crf, 23);
        assert_eq!(config.ffmpeg_path, PathBuf::from("ffmpeg"));
    }
}
