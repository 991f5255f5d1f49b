pub mod cache;
pub mod catalog;
pub mod config;
pub mod distributor;
pub mod error;
pub mod excerpt;
pub mod fetcher;
pub mod metrics;
pub mod orchestrator;
pub mod publisher;
pub mod retry;
pub mod testing;

pub use cache::{DedupCache, InMemoryCache, RedisCache};
pub use catalog::{Asset, AssetTag, CatalogClient, CatalogError, DriveCatalog};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use distributor::{DistributeError, Distributor, SweepReport, TelegramDistributor};
pub use error::ErrorKind;
pub use excerpt::{ExcerptEngine, ExcerptError, ExcerptOutcome, FfmpegTool, MediaTool};
pub use fetcher::{DriveFetcher, FetchError, Fetcher, StagedFile};
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorError, RunReport, RunStatus};
pub use publisher::{FeedClient, PublishError, PublishReport, Publisher, XFeedClient};
pub use retry::{RetryConfig, RetryPolicy};
