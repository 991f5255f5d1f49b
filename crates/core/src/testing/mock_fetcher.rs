//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::catalog::Asset;
use crate::fetcher::{DownloadProgress, FetchError, Fetcher, StagedFile};

/// Mock implementation of the Fetcher trait.
///
/// "Downloads" by writing a small placeholder file named after the asset.
#[derive(Debug, Clone, Default)]
pub struct MockFetcher {
    downloads: Arc<RwLock<Vec<String>>>,
    failing: Arc<RwLock<HashSet<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every download of the asset with `asset_id` fail.
    pub async fn fail_asset(&self, asset_id: &str) {
        self.failing.write().await.insert(asset_id.to_string());
    }

    /// Ids of the assets downloaded successfully, in call order.
    pub async fn recorded_downloads(&self) -> Vec<String> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(
        &self,
        asset: &Asset,
        dest_dir: &Path,
        progress: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<StagedFile, FetchError> {
        if self.failing.read().await.contains(&asset.id) {
            return Err(FetchError::Api {
                status: 404,
                message: format!("File not found: {}", asset.id),
            });
        }

        let content = format!("mock video {}", asset.id).into_bytes();
        let path = dest_dir.join(&asset.name);
        tokio::fs::create_dir_all(dest_dir).await?;
        tokio::fs::write(&path, &content).await?;

        if let Some(tx) = progress {
            let _ = tx.try_send(DownloadProgress {
                bytes_done: content.len() as u64,
                total_bytes: Some(content.len() as u64),
            });
        }

        self.downloads.write().await.push(asset.id.clone());
        Ok(StagedFile::new(path, Some(asset.id.clone())))
    }
}
