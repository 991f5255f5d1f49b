//! Run orchestrator implementation.
//!
//! One run is strictly sequential:
//! list, filter, pick, download, record, sweep, excerpt, publish, clean up.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Local, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::{processed_marker, DedupCache};
use crate::catalog::{eligible_assets, pick_uniform, AssetTag, CatalogClient};
use crate::distributor::{list_staged_media, sweep, Distributor};
use crate::error::ErrorKind;
use crate::excerpt::{ExcerptEngine, ExcerptOutcome};
use crate::fetcher::{Fetcher, StagedFile};
use crate::metrics;
use crate::publisher::Publisher;

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, RunReport, RunStatus};

/// Drives one pipeline run across the collaborators.
pub struct Orchestrator {
    config: OrchestratorConfig,
    catalog: Arc<dyn CatalogClient>,
    cache: Arc<dyn DedupCache>,
    fetcher: Arc<dyn Fetcher>,
    distributor: Arc<dyn Distributor>,
    excerpts: ExcerptEngine,
    publisher: Publisher,
    rng: Mutex<StdRng>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        catalog: Arc<dyn CatalogClient>,
        cache: Arc<dyn DedupCache>,
        fetcher: Arc<dyn Fetcher>,
        distributor: Arc<dyn Distributor>,
        excerpts: ExcerptEngine,
        publisher: Publisher,
    ) -> Self {
        Self {
            config,
            catalog,
            cache,
            fetcher,
            distributor,
            excerpts,
            publisher,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Use a fixed seed for every random choice the orchestrator makes.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Execute one run for `tier`.
    ///
    /// Only problems that stop the run before anything is staged come back as
    /// errors. Everything later is reported through [`RunReport::status`].
    pub async fn run(&self, tier: AssetTag) -> Result<RunReport, OrchestratorError> {
        let run_id = Uuid::new_v4().to_string();
        let mut report = RunReport::new(run_id.clone(), tier);
        info!(run_id = %run_id, tier = %tier, "Starting run");

        let result = self.execute(tier, &mut report).await;
        report.finished_at = Utc::now();

        let status_label = match &result {
            Ok(()) => report.status.as_str(),
            Err(_) => "error",
        };
        metrics::RUNS.with_label_values(&[status_label]).inc();

        match result {
            Ok(()) => {
                let elapsed_ms = (report.finished_at - report.started_at).num_milliseconds();
                if report.status.is_failure() {
                    warn!(run_id = %run_id, status = %report.status, elapsed_ms, "Run finished with failures");
                } else {
                    info!(run_id = %run_id, status = %report.status, elapsed_ms, "Run finished");
                }
                Ok(report)
            }
            Err(e) => {
                error!(run_id = %run_id, kind = %e.kind(), "Run aborted: {}", e);
                Err(e)
            }
        }
    }

    async fn execute(&self, tier: AssetTag, report: &mut RunReport) -> Result<(), OrchestratorError> {
        let assets = match self.catalog.list(&self.config.folder_id).await {
            Ok(assets) => assets,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(folder_id = %self.config.folder_id, "Catalog folder not found: {}", e);
                report.status = RunStatus::NothingToDo;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let pool = eligible_assets(&assets, tier, self.cache.as_ref()).await;
        report.pool_size = pool.len();
        info!(
            listed = assets.len(),
            eligible = pool.len(),
            tier = %tier,
            "Catalog filtered"
        );

        let selected = {
            let mut rng = self.lock_rng();
            pick_uniform(&pool, &mut *rng).cloned()
        };
        let Some(asset) = selected else {
            info!(tier = %tier, "No uncached assets for tier, nothing to do");
            report.status = RunStatus::NothingToDo;
            return Ok(());
        };
        info!(asset_id = %asset.id, name = %asset.name, "Selected asset");
        report.selected = Some(asset.clone());

        tokio::fs::create_dir_all(&self.config.staging_dir)
            .await
            .map_err(|source| OrchestratorError::Staging {
                path: self.config.staging_dir.clone(),
                source,
            })?;

        let staged = match self
            .fetcher
            .download(&asset, &self.config.staging_dir, None)
            .await
        {
            Ok(staged) => staged,
            Err(e) => {
                error!(asset_id = %asset.id, kind = %e.kind(), "Download failed: {}", e);
                report.status = RunStatus::FetchFailed;
                return Ok(());
            }
        };
        report.staged = Some(staged.clone());

        // Recorded only now that the file is on disk.
        let marker = processed_marker(&self.config.marker_prefix, Local::now().date_naive());
        report.cache_recorded = self.cache.set(&asset.name, &marker).await;
        if !report.cache_recorded {
            warn!(name = %asset.name, cache = self.cache.name(), "Could not record asset in cache");
        }

        let distribution = sweep(
            &self.config.staging_dir,
            &self.config.media_extensions,
            self.distributor.as_ref(),
            self.cache.as_ref(),
            self.config.distribution_caption.as_deref(),
        )
        .await;

        // Files the channel rejected stay staged until a sweep delivers them.
        let undelivered: HashSet<String> =
            distribution.failed.iter().map(|f| f.file.clone()).collect();
        report.distribution = Some(distribution);

        let Some(source) = self.pick_excerpt_source(&undelivered).await else {
            info!("No staged file eligible for an excerpt");
            report.status = RunStatus::Completed;
            return Ok(());
        };
        report.excerpt_source = Some(source.path.clone());

        self.excerpt_and_publish(&source, report).await;
        Ok(())
    }

    /// Excerpt, publish and apply the cleanup policy.
    ///
    /// | outcome            | source   | excerpt  |
    /// |--------------------|----------|----------|
    /// | ignored            | deleted  | none     |
    /// | error              | retained | none     |
    /// | published          | deleted  | deleted  |
    /// | publish failed     | retained | deleted  |
    async fn excerpt_and_publish(&self, source: &StagedFile, report: &mut RunReport) {
        let output = self.excerpt_path(source);
        let excerpt = self.excerpts.derive(&source.path, &output).await;
        let outcome = excerpt.outcome;
        let excerpt_path = excerpt.excerpt.as_ref().map(|e| e.path.clone());
        report.excerpt = Some(excerpt);

        match outcome {
            ExcerptOutcome::Ignored => {
                report.source_removed = remove_file(&source.path).await;
                report.status = RunStatus::ExcerptIgnored;
            }
            ExcerptOutcome::Error => {
                // A failed trim may leave a partial file behind.
                remove_file(&output).await;
                info!(source = %source.path.display(), "Source retained for a later run");
                report.status = RunStatus::ExcerptFailed;
            }
            ExcerptOutcome::Success => {
                let path = excerpt_path.unwrap_or(output);
                let publish = self
                    .publisher
                    .publish(&path, &self.config.post_caption)
                    .await;

                report.excerpt_removed = remove_file(&path).await;
                if publish.success {
                    report.source_removed = remove_file(&source.path).await;
                    report.status = RunStatus::Completed;
                } else {
                    info!(source = %source.path.display(), "Source retained for a later run");
                    report.status = RunStatus::PublishFailed;
                }
                report.publish = Some(publish);
            }
        }
    }

    /// A random staged file with an excerpt extension, skipping `undelivered`.
    async fn pick_excerpt_source(&self, undelivered: &HashSet<String>) -> Option<StagedFile> {
        let candidates: Vec<StagedFile> =
            match list_staged_media(&self.config.staging_dir, &self.config.excerpt_extensions).await
            {
                Ok(files) => files
                    .into_iter()
                    .filter(|f| !undelivered.contains(&f.file_name()))
                    .collect(),
                Err(e) => {
                    warn!(dir = %self.config.staging_dir.display(), "Cannot list staging folder: {}", e);
                    return None;
                }
            };
        if candidates.is_empty() {
            return None;
        }

        let index = self.lock_rng().random_range(0..candidates.len());
        debug!(candidates = candidates.len(), index, "Picked excerpt source");
        candidates.into_iter().nth(index)
    }

    fn excerpt_path(&self, source: &StagedFile) -> PathBuf {
        let stem = source
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "excerpt".to_string());
        let suffix = Uuid::new_v4().simple().to_string();
        self.config
            .excerpt_dir()
            .join(format!("{}-excerpt-{}.mp4", stem, &suffix[..8]))
    }

    fn lock_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Delete a file, logging instead of failing. Returns whether it is gone.
async fn remove_file(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "Removed file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), "Failed to remove file: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::catalog::{Asset, CatalogError};
    use crate::excerpt::{ExcerptConfig, ExcerptError};
    use crate::publisher::PublisherConfig;
    use crate::retry::RetryConfig;
    use crate::testing::{MockCatalog, MockDistributor, MockFeedClient, MockFetcher, MockMediaTool};
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        staging: PathBuf,
        catalog: MockCatalog,
        cache: Arc<InMemoryCache>,
        fetcher: MockFetcher,
        distributor: MockDistributor,
        tool: MockMediaTool,
        feed: MockFeedClient,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let staging = dir.path().join("staging");
            Self {
                _dir: dir,
                staging,
                catalog: MockCatalog::new(),
                cache: Arc::new(InMemoryCache::new()),
                fetcher: MockFetcher::new(),
                distributor: MockDistributor::new(),
                tool: MockMediaTool::new(),
                feed: MockFeedClient::new(),
            }
        }

        fn orchestrator(&self) -> Orchestrator {
            let config = OrchestratorConfig {
                folder_id: "folder".to_string(),
                staging_dir: self.staging.clone(),
                media_extensions: vec!["mp4".to_string(), "avi".to_string()],
                excerpt_extensions: vec!["mp4".to_string()],
                marker_prefix: "Downloaded on".to_string(),
                distribution_caption: None,
                post_caption: "Full video in the group".to_string(),
            };
            let publisher_config = PublisherConfig {
                access_token: "token".to_string(),
                poll_interval_secs: 0,
                retry: RetryConfig {
                    max_attempts: 3,
                    base_delay_ms: 1,
                    max_delay_ms: 2,
                    ..RetryConfig::default()
                },
                ..PublisherConfig::default()
            };

            Orchestrator::new(
                config,
                Arc::new(self.catalog.clone()),
                self.cache.clone(),
                Arc::new(self.fetcher.clone()),
                Arc::new(self.distributor.clone()),
                ExcerptEngine::new(Arc::new(self.tool.clone()), &ExcerptConfig::default()),
                Publisher::new(Arc::new(self.feed.clone()), &publisher_config),
            )
            .with_seed(7)
        }
    }

    fn free(name: &str) -> Asset {
        Asset::new(format!("id-{}", name), name, Some(1024), "paid_")
    }

    #[tokio::test]
    async fn test_empty_catalog_is_nothing_to_do() {
        let h = Harness::new();

        let report = h.orchestrator().run(AssetTag::Free).await.unwrap();

        assert_eq!(report.status, RunStatus::NothingToDo);
        assert!(h.fetcher.recorded_downloads().await.is_empty());
        assert!(!h.staging.exists());
    }

    #[tokio::test]
    async fn test_missing_folder_is_nothing_to_do() {
        let h = Harness::new();
        h.catalog
            .set_error(CatalogError::NotFound("folder".to_string()))
            .await;

        let report = h.orchestrator().run(AssetTag::Free).await.unwrap();
        assert_eq!(report.status, RunStatus::NothingToDo);
    }

    #[tokio::test]
    async fn test_catalog_failure_aborts() {
        let h = Harness::new();
        h.catalog
            .set_error(CatalogError::Api {
                status: 500,
                message: "backend".to_string(),
            })
            .await;

        let err = h.orchestrator().run(AssetTag::Free).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Catalog(_)));
    }

    #[tokio::test]
    async fn test_fully_cached_tier_has_no_side_effects() {
        let h = Harness::new();
        h.catalog.set_assets(vec![free("a.mp4")]).await;
        h.cache.set("a.mp4", "Downloaded on 2024-01-01").await;

        let report = h.orchestrator().run(AssetTag::Free).await.unwrap();

        assert_eq!(report.status, RunStatus::NothingToDo);
        assert_eq!(report.pool_size, 0);
        assert!(h.fetcher.recorded_downloads().await.is_empty());
        assert!(h.distributor.recorded_publishes().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_download_is_not_cached() {
        let h = Harness::new();
        h.catalog.set_assets(vec![free("a.mp4")]).await;
        h.fetcher.fail_asset("id-a.mp4").await;

        let report = h.orchestrator().run(AssetTag::Free).await.unwrap();

        assert_eq!(report.status, RunStatus::FetchFailed);
        assert!(h.cache.get("a.mp4").await.is_none());
        assert!(h.distributor.recorded_publishes().await.is_empty());
    }

    #[tokio::test]
    async fn test_successful_run_cleans_up() {
        let h = Harness::new();
        h.catalog.set_assets(vec![free("a.mp4")]).await;
        h.tool.set_duration(400.0).await;

        let report = h.orchestrator().run(AssetTag::Free).await.unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert!(report.cache_recorded);
        assert!(h.cache.get("a.mp4").await.unwrap().starts_with("Downloaded on "));
        assert_eq!(h.distributor.recorded_publishes().await.len(), 1);
        assert_eq!(
            h.feed.recorded_posts().await,
            vec!["Full video in the group".to_string()]
        );
        assert!(report.source_removed);
        assert!(report.excerpt_removed);
        assert!(!h.staging.join("a.mp4").exists());
        assert!(std::fs::read_dir(h.staging.join("excerpts")).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_probe_error_retains_source() {
        let h = Harness::new();
        h.catalog.set_assets(vec![free("a.mp4")]).await;
        h.tool
            .set_next_probe_error(ExcerptError::probe_failed("bad header"))
            .await;

        let report = h.orchestrator().run(AssetTag::Free).await.unwrap();

        assert_eq!(report.status, RunStatus::ExcerptFailed);
        assert!(report.publish.is_none());
        assert!(h.staging.join("a.mp4").exists());
        assert_eq!(h.feed.upload_count().await, 0);
    }

    #[tokio::test]
    async fn test_non_excerpt_extension_completes_without_post() {
        let h = Harness::new();
        h.catalog.set_assets(vec![free("a.avi")]).await;

        let report = h.orchestrator().run(AssetTag::Free).await.unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert!(report.excerpt.is_none());
        assert_eq!(h.distributor.recorded_publishes().await.len(), 1);
        assert!(h.staging.join("a.avi").exists());
    }
}
