//! Staging-folder sweep.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{distributed_key, processed_marker, DedupCache};
use crate::error::ErrorKind;
use crate::fetcher::StagedFile;
use crate::metrics;

use super::traits::Distributor;
use super::types::has_extension;

/// Marker stored under the distributed key once a file is delivered.
const DISTRIBUTED_MARKER: &str = "Distributed on";

/// One file the channel did not accept.
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub file: String,
    pub kind: ErrorKind,
    pub error: String,
}

/// Outcome of one sweep over the staging folder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub delivered: Vec<String>,
    /// Already delivered by an earlier run.
    pub skipped: Vec<String>,
    pub failed: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Media files currently in `dir`, sorted by name.
///
/// A missing folder is treated as empty.
pub async fn list_staged_media(
    dir: &Path,
    extensions: &[String],
) -> std::io::Result<Vec<StagedFile>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && has_extension(&path, extensions) {
            files.push(StagedFile::new(path, None));
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Offer every staged media file to `distributor`, once.
///
/// Files whose distributed key is already in the cache are skipped. A
/// failure on one file is recorded and the sweep moves on to the next.
pub async fn sweep(
    dir: &Path,
    extensions: &[String],
    distributor: &dyn Distributor,
    cache: &dyn DedupCache,
    caption: Option<&str>,
) -> SweepReport {
    let mut report = SweepReport::default();

    let files = match list_staged_media(dir, extensions).await {
        Ok(files) => files,
        Err(e) => {
            warn!(dir = %dir.display(), "Cannot read staging folder: {}", e);
            return report;
        }
    };

    debug!(dir = %dir.display(), files = files.len(), "Sweeping staging folder");

    for file in files {
        let name = file.file_name();
        let key = distributed_key(&name);

        if cache.get(&key).await.is_some() {
            debug!(file = %name, "Already distributed, skipping");
            metrics::DISTRIBUTIONS.with_label_values(&["skipped"]).inc();
            report.skipped.push(name);
            continue;
        }

        match distributor.publish(&file, caption).await {
            Ok(receipt) => {
                let marker = processed_marker(DISTRIBUTED_MARKER, chrono::Local::now().date_naive());
                if !cache.set(&key, &marker).await {
                    warn!(file = %name, "Could not record distribution, file may be sent again");
                }
                debug!(file = %name, message_id = receipt.message_id, "Distributed");
                metrics::DISTRIBUTIONS.with_label_values(&["delivered"]).inc();
                report.delivered.push(name);
            }
            Err(e) => {
                warn!(
                    file = %name,
                    kind = %e.kind(),
                    distributor = distributor.name(),
                    "Distribution failed: {}",
                    e
                );
                metrics::DISTRIBUTIONS.with_label_values(&["failed"]).inc();
                report.failed.push(SweepFailure {
                    file: name,
                    kind: e.kind(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        delivered = report.delivered.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Distribution sweep finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::testing::MockDistributor;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["mp4".to_string(), "mkv".to_string()]
    }

    #[tokio::test]
    async fn test_list_ignores_partials_and_other_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("a.mkv"), b"x").unwrap();
        std::fs::write(dir.path().join("c.mp4.part"), b"x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub.mp4")).unwrap();

        let files = list_staged_media(dir.path(), &exts()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name()).collect();
        assert_eq!(names, vec!["a.mkv", "b.mp4"]);
    }

    #[tokio::test]
    async fn test_missing_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = list_staged_media(&dir.path().join("nope"), &exts())
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_delivers_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"x").unwrap();

        let distributor = MockDistributor::new();
        let cache = InMemoryCache::new();

        let first = sweep(dir.path(), &exts(), &distributor, &cache, Some("cap")).await;
        assert_eq!(first.delivered, vec!["a.mp4", "b.mp4"]);
        assert!(first.is_clean());

        let second = sweep(dir.path(), &exts(), &distributor, &cache, Some("cap")).await;
        assert!(second.delivered.is_empty());
        assert_eq!(second.skipped.len(), 2);

        let published = distributor.recorded_publishes().await;
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].1.as_deref(), Some("cap"));
    }

    #[tokio::test]
    async fn test_sweep_continues_past_failures() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"x").unwrap();

        let distributor = MockDistributor::new();
        distributor.fail_file("a.mp4").await;
        let cache = InMemoryCache::new();

        let report = sweep(dir.path(), &exts(), &distributor, &cache, None).await;
        assert_eq!(report.delivered, vec!["b.mp4"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].file, "a.mp4");
        assert!(cache.get(&distributed_key("a.mp4")).await.is_none());
    }
}
