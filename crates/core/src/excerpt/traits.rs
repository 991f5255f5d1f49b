//! Trait definitions for the excerpt module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ExcerptError;
use super::types::ExcerptWindow;

/// External media tool able to measure and cut video files.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Returns the name of this tool implementation.
    fn name(&self) -> &str;

    /// Duration of the file at `path`, in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64, ExcerptError>;

    /// Cut `window` out of `input` into `output`, re-encoding.
    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        window: ExcerptWindow,
    ) -> Result<(), ExcerptError>;

    /// Validates that the tool is installed and runnable.
    async fn validate(&self) -> Result<(), ExcerptError>;
}
