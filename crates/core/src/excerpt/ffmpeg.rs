//! FFmpeg-based media tool.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use super::config::ExcerptConfig;
use super::error::ExcerptError;
use super::traits::MediaTool;
use super::types::ExcerptWindow;

/// Lines of ffmpeg stderr kept for diagnostics.
const STDERR_TAIL_LINES: usize = 20;

/// Probes with ffprobe and trims with ffmpeg.
pub struct FfmpegTool {
    config: ExcerptConfig,
}

impl FfmpegTool {
    pub fn new(config: ExcerptConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ExcerptConfig::default())
    }

    /// Builds ffmpeg arguments for cutting `window` out of `input`.
    ///
    /// `-ss` goes before `-i` so ffmpeg seeks the input instead of decoding
    /// everything up to the offset.
    fn build_trim_args(&self, input: &Path, output: &Path, window: ExcerptWindow) -> Vec<String> {
        vec![
            "-ss".to_string(),
            window.start_offset_secs.to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-t".to_string(),
            window.duration_secs.to_string(),
            "-c:v".to_string(),
            self.config.video_codec.clone(),
            "-preset".to_string(),
            self.config.preset.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Extracts the duration from ffprobe JSON output.
    ///
    /// Uses the container duration, falling back to the first stream that
    /// reports one.
    fn parse_probe_duration(output: &str) -> Result<f64, ExcerptError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            #[serde(default)]
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            duration: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ExcerptError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let parse = |d: &Option<String>| d.as_ref().and_then(|s| s.trim().parse::<f64>().ok());

        let duration = probe
            .format
            .as_ref()
            .and_then(|f| parse(&f.duration))
            .or_else(|| probe.streams.iter().find_map(|s| parse(&s.duration)))
            .ok_or_else(|| ExcerptError::ParseError {
                reason: "no duration in ffprobe output".to_string(),
            })?;

        if !duration.is_finite() || duration < 0.0 {
            return Err(ExcerptError::ParseError {
                reason: format!("invalid duration: {}", duration),
            });
        }

        Ok(duration)
    }

    fn spawn_error(&self, e: std::io::Error, ffprobe: bool) -> ExcerptError {
        if e.kind() == std::io::ErrorKind::NotFound {
            if ffprobe {
                ExcerptError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                }
            } else {
                ExcerptError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                }
            }
        } else {
            ExcerptError::Io(e)
        }
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, ExcerptError> {
        if !path.exists() {
            return Err(ExcerptError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| self.spawn_error(e, true))?;

        if !output.status.success() {
            return Err(ExcerptError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let duration = Self::parse_probe_duration(&stdout)?;
        debug!(path = %path.display(), duration_secs = duration, "Probed duration");
        Ok(duration)
    }

    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        window: ExcerptWindow,
    ) -> Result<(), ExcerptError> {
        let start = Instant::now();

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_trim_args(input, output, window);
        debug!(args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e, false))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ExcerptError::trim_failed("stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

            while let Ok(Some(line)) = reader.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, VecDeque<String>), std::io::Error>((status, tail))
        })
        .await;

        match result {
            Ok(Ok((status, tail))) => {
                if !status.success() {
                    let stderr = Vec::from(tail).join("\n");
                    return Err(ExcerptError::trim_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if stderr.is_empty() { None } else { Some(stderr) },
                    ));
                }
            }
            Ok(Err(e)) => return Err(ExcerptError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(ExcerptError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        }

        let meta = tokio::fs::metadata(output)
            .await
            .map_err(|_| ExcerptError::trim_failed("Output file not created", None))?;

        info!(
            output = %output.display(),
            bytes = meta.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Excerpt written"
        );
        Ok(())
    }

    async fn validate(&self) -> Result<(), ExcerptError> {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e, false))?;

        Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e, true))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::path::PathBuf;

    #[test]
    fn test_build_trim_args_default_window() {
        let tool = FfmpegTool::with_defaults();
        let args = tool.build_trim_args(
            Path::new("/staging/in.mp4"),
            Path::new("/staging/excerpts/out.mp4"),
            ExcerptWindow::default(),
        );

        assert_eq!(
            args,
            vec![
                "-ss", "120", "-i", "/staging/in.mp4", "-t", "120", "-c:v", "libx264",
                "-preset", "veryfast", "-crf", "23", "-c:a", "aac", "-y",
                "/staging/excerpts/out.mp4",
            ]
        );
    }

    #[test]
    fn test_build_trim_args_custom_encoder() {
        let tool = FfmpegTool::new(ExcerptConfig {
            video_codec: "libx265".to_string(),
            crf: 28,
            ..ExcerptConfig::default()
        });
        let args = tool.build_trim_args(
            Path::new("in.mkv"),
            Path::new("out.mp4"),
            ExcerptWindow::new(30, 15),
        );
        assert!(args.windows(2).any(|w| w == ["-ss", "30"]));
        assert!(args.windows(2).any(|w| w == ["-t", "15"]));
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx265"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "28"]));
    }

    #[test]
    fn test_parse_probe_duration_from_format() {
        let json = r#"{
            "format": {"filename": "a.mp4", "format_name": "mov,mp4", "duration": "400.250000"},
            "streams": [{"codec_type": "video", "duration": "399.9"}]
        }"#;
        let d = FfmpegTool::parse_probe_duration(json).unwrap();
        assert!((d - 400.25).abs() < 1e-6);
    }

    #[test]
    fn test_parse_probe_duration_falls_back_to_stream() {
        let json = r#"{
            "format": {"filename": "a.mkv"},
            "streams": [
                {"codec_type": "subtitle"},
                {"codec_type": "video", "duration": "250.0"}
            ]
        }"#;
        assert_eq!(FfmpegTool::parse_probe_duration(json).unwrap(), 250.0);
    }

    #[test]
    fn test_parse_probe_duration_missing() {
        let err = FfmpegTool::parse_probe_duration(r#"{"format": {}, "streams": []}"#).unwrap_err();
        assert!(matches!(err, ExcerptError::ParseError { .. }));
        assert_eq!(err.kind(), ErrorKind::ToolFailure);

        assert!(FfmpegTool::parse_probe_duration("not json").is_err());
        assert!(FfmpegTool::parse_probe_duration(r#"{"format": {"duration": "-3"}}"#).is_err());
    }

    #[tokio::test]
    async fn test_probe_missing_input() {
        let tool = FfmpegTool::with_defaults();
        let err = tool
            .probe_duration(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExcerptError::InputNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_missing_binary_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("in.mp4");
        std::fs::write(&input, b"x").unwrap();

        let tool = FfmpegTool::new(ExcerptConfig {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe_path: PathBuf::from("/nonexistent/ffprobe"),
            ..ExcerptConfig::default()
        });

        let err = tool.probe_duration(&input).await.unwrap_err();
        assert!(matches!(err, ExcerptError::FfprobeNotFound { .. }));

        let err = tool
            .trim(&input, &dir.path().join("out.mp4"), ExcerptWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExcerptError::FfmpegNotFound { .. }));

        assert!(tool.validate().await.is_err());
    }
}
