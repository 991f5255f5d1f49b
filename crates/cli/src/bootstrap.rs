//! Construction of the production adapters from configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use reelcast_core::{
    Config, DedupCache, DriveCatalog, DriveFetcher, ExcerptEngine, FfmpegTool, MediaTool,
    Orchestrator, OrchestratorConfig, Publisher, RedisCache, TelegramDistributor, XFeedClient,
};

/// Every collaborator a run needs, built once per process.
pub struct Adapters {
    pub cache: Arc<dyn DedupCache>,
    pub catalog: Arc<DriveCatalog>,
    pub fetcher: Arc<DriveFetcher>,
    pub distributor: Arc<TelegramDistributor>,
    pub media_tool: Arc<dyn MediaTool>,
    pub feed: Arc<XFeedClient>,
}

impl Adapters {
    pub async fn build(config: &Config) -> Result<Self> {
        let cache = RedisCache::connect(&config.cache).await;
        info!(endpoint = cache.endpoint(), "Cache initialized");

        let catalog = DriveCatalog::new(&config.catalog).context("Failed to create catalog client")?;
        let fetcher = DriveFetcher::new(&config.catalog).context("Failed to create fetcher")?;
        let media_tool: Arc<dyn MediaTool> = Arc::new(FfmpegTool::new(config.excerpt.clone()));
        let distributor = TelegramDistributor::new(&config.distributor)
            .context("Failed to create distribution client")?
            .with_previews(ExcerptEngine::new(media_tool.clone(), &config.excerpt));
        let feed = XFeedClient::new(&config.publisher).context("Failed to create feed client")?;

        Ok(Self {
            cache: Arc::new(cache),
            catalog: Arc::new(catalog),
            fetcher: Arc::new(fetcher),
            distributor: Arc::new(distributor),
            media_tool,
            feed: Arc::new(feed),
        })
    }

    pub fn into_orchestrator(self, config: &Config) -> Orchestrator {
        Orchestrator::new(
            OrchestratorConfig::from(config),
            self.catalog,
            self.cache,
            self.fetcher,
            self.distributor,
            ExcerptEngine::new(self.media_tool, &config.excerpt),
            Publisher::new(self.feed, &config.publisher),
        )
    }
}
