//! Streams Drive file contents to disk.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::catalog::Asset;
use crate::config::CatalogConfig;
use crate::metrics;

use super::error::FetchError;
use super::traits::Fetcher;
use super::types::{part_path, staged_path, DownloadProgress, StagedFile};

pub struct DriveFetcher {
    client: Client,
    base_url: String,
    access_token: String,
    report_every: u64,
}

impl DriveFetcher {
    pub fn new(config: &CatalogConfig) -> Result<Self, FetchError> {
        // Downloads can be large; only bound the connect phase.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            report_every: config.chunk_size_bytes.max(1),
        })
    }

    async fn stream_to(
        &self,
        asset: &Asset,
        part: &Path,
        progress: Option<&mpsc::Sender<DownloadProgress>>,
    ) -> Result<u64, FetchError> {
        let url = format!(
            "{}/drive/v3/files/{}",
            self.base_url,
            urlencoding::encode(&asset.id)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let total = asset.size.or_else(|| response.content_length());
        if total.is_none() {
            debug!(asset = %asset.name, "Size unknown, progress is indeterminate");
        }

        let mut file = tokio::fs::File::create(part).await?;
        let mut stream = response.bytes_stream();
        let mut done: u64 = 0;
        let mut next_report = self.report_every;
        let mut last_decile: u8 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            done += chunk.len() as u64;
            metrics::DOWNLOADED_BYTES.inc_by(chunk.len() as u64);

            if done < next_report {
                continue;
            }
            next_report = done + self.report_every;

            let update = DownloadProgress {
                bytes_done: done,
                total_bytes: total,
            };
            if let Some(tx) = progress {
                let _ = tx.try_send(update);
            }
            match update.percent() {
                Some(pct) if pct / 10 > last_decile => {
                    last_decile = pct / 10;
                    info!(asset = %asset.name, percent = pct, bytes = done, "Download progress");
                }
                Some(_) => {}
                None => debug!(asset = %asset.name, bytes = done, "Download progress"),
            }
        }

        file.flush().await?;
        file.sync_all().await?;

        if let Some(tx) = progress {
            let _ = tx.try_send(DownloadProgress {
                bytes_done: done,
                total_bytes: total.or(Some(done)),
            });
        }

        Ok(done)
    }
}

#[async_trait]
impl Fetcher for DriveFetcher {
    fn name(&self) -> &str {
        "drive"
    }

    async fn download(
        &self,
        asset: &Asset,
        dest_dir: &Path,
        progress: Option<mpsc::Sender<DownloadProgress>>,
    ) -> Result<StagedFile, FetchError> {
        let target = staged_path(dest_dir, &asset.name)?;
        let part = part_path(&target);

        tokio::fs::create_dir_all(dest_dir).await?;
        info!(asset = %asset.name, id = %asset.id, dest = %target.display(), "Downloading asset");

        match self.stream_to(asset, &part, progress.as_ref()).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, &target).await?;
                info!(asset = %asset.name, bytes = bytes, "Download complete");
                Ok(StagedFile::new(target, Some(asset.id.clone())))
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&part).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %part.display(), "Failed to remove partial download: {}", rm);
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> CatalogConfig {
        CatalogConfig {
            api_url: server.uri(),
            folder_id: "folder-1".to_string(),
            access_token: "token".to_string(),
            paid_prefix: "paid_".to_string(),
            timeout_secs: 5,
            page_size: 100,
            chunk_size_bytes: 256,
        }
    }

    #[tokio::test]
    async fn test_download_writes_file_and_reports_progress() {
        let server = MockServer::start().await;
        let body = vec![7u8; 2048];
        Mock::given(method("GET"))
            .and(path("/drive/v3/files/file-1"))
            .and(query_param("alt", "media"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let fetcher = DriveFetcher::new(&config_for(&server)).unwrap();
        let asset = Asset::new("file-1", "clip.mp4", Some(2048), "paid_");
        let (tx, mut rx) = mpsc::channel(64);

        let staged = fetcher.download(&asset, dir.path(), Some(tx)).await.unwrap();

        assert_eq!(staged.path, dir.path().join("clip.mp4"));
        assert_eq!(staged.source_asset_id.as_deref(), Some("file-1"));
        assert_eq!(std::fs::read(&staged.path).unwrap(), body);
        assert!(!dir.path().join("clip.mp4.part").exists());

        let mut last = None;
        while let Ok(update) = rx.try_recv() {
            last = Some(update);
        }
        let last = last.unwrap();
        assert_eq!(last.bytes_done, 2048);
        assert_eq!(last.percent(), Some(100));
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing_staged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drive/v3/files/file-2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let fetcher = DriveFetcher::new(&config_for(&server)).unwrap();
        let asset = Asset::new("file-2", "clip.mp4", None, "paid_");

        let err = fetcher.download(&asset, dir.path(), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientRemote);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_path_in_name() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let fetcher = DriveFetcher::new(&config_for(&server)).unwrap();
        let asset = Asset::new("file-3", "../escape.mp4", None, "paid_");

        let err = fetcher.download(&asset, dir.path(), None).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidName(_)));
    }
}
