use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::catalog::Asset;

use super::error::FetchError;
use super::types::{DownloadProgress, StagedFile};

/// Downloads one asset into a local folder.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Download `asset` into `dest_dir`.
    ///
    /// The file only appears under its final name once the download is
    /// complete. Progress updates are sent on `progress` when given; a full
    /// channel drops updates rather than stalling the download.
    async fn download(
        &self,
        asset: &Asset,
        dest_dir: &Path,
        progress: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<StagedFile, FetchError>;
}
