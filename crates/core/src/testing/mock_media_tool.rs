//! Mock media tool for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::excerpt::{ExcerptError, ExcerptWindow, MediaTool};

/// Duration reported when none was configured.
const DEFAULT_DURATION_SECS: f64 = 600.0;

/// A recorded trim: input, output and window.
pub type RecordedTrim = (PathBuf, PathBuf, ExcerptWindow);

/// Mock implementation of the MediaTool trait.
///
/// Probes report a configurable duration. Trims write a small file at the
/// output path so callers can observe and clean it up.
#[derive(Debug, Clone)]
pub struct MockMediaTool {
    duration_secs: Arc<RwLock<f64>>,
    next_probe_error: Arc<RwLock<Option<ExcerptError>>>,
    next_trim_error: Arc<RwLock<Option<ExcerptError>>>,
    trims: Arc<RwLock<Vec<RecordedTrim>>>,
}

impl Default for MockMediaTool {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMediaTool {
    pub fn new() -> Self {
        Self {
            duration_secs: Arc::new(RwLock::new(DEFAULT_DURATION_SECS)),
            next_probe_error: Arc::new(RwLock::new(None)),
            next_trim_error: Arc::new(RwLock::new(None)),
            trims: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Duration reported by every probe.
    pub async fn set_duration(&self, secs: f64) {
        *self.duration_secs.write().await = secs;
    }

    /// The next probe fails with `error`.
    pub async fn set_next_probe_error(&self, error: ExcerptError) {
        *self.next_probe_error.write().await = Some(error);
    }

    /// The next trim fails with `error`.
    pub async fn set_next_trim_error(&self, error: ExcerptError) {
        *self.next_trim_error.write().await = Some(error);
    }

    pub async fn recorded_trims(&self) -> Vec<RecordedTrim> {
        self.trims.read().await.clone()
    }
}

#[async_trait]
impl MediaTool for MockMediaTool {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe_duration(&self, _path: &Path) -> Result<f64, ExcerptError> {
        if let Some(e) = self.next_probe_error.write().await.take() {
            return Err(e);
        }
        Ok(*self.duration_secs.read().await)
    }

    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        window: ExcerptWindow,
    ) -> Result<(), ExcerptError> {
        self.trims
            .write()
            .await
            .push((input.to_path_buf(), output.to_path_buf(), window));

        if let Some(e) = self.next_trim_error.write().await.take() {
            return Err(e);
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(output, b"mock excerpt").await?;
        Ok(())
    }

    async fn validate(&self) -> Result<(), ExcerptError> {
        Ok(())
    }
}
