//! Mock implementations of every external collaborator.
//!
//! Each mock is cheap to clone and shares its state between clones, so a
//! test can hand one clone to the code under test and keep another for
//! configuring behavior and asserting on recorded calls.
//!
//! ```rust,ignore
//! use reelcast_core::testing::{MockFeedClient, MockMediaTool};
//!
//! let tool = MockMediaTool::new();
//! tool.set_duration(400.0).await;
//!
//! let feed = MockFeedClient::new();
//! // ...run the pipeline...
//! assert_eq!(feed.recorded_posts().await.len(), 1);
//! ```

mod mock_catalog;
mod mock_distributor;
mod mock_feed_client;
mod mock_fetcher;
mod mock_media_tool;

pub use mock_catalog::MockCatalog;
pub use mock_distributor::MockDistributor;
pub use mock_feed_client::MockFeedClient;
pub use mock_fetcher::MockFetcher;
pub use mock_media_tool::MockMediaTool;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::catalog::Asset;

    /// Prefix used for paid assets in fixtures.
    pub const PAID_PREFIX: &str = "paid_";

    /// A free asset whose id is derived from its name.
    pub fn free_asset(name: &str) -> Asset {
        Asset::new(format!("id-{}", name), name, Some(10 * 1024 * 1024), PAID_PREFIX)
    }

    /// A paid asset priced at `stars`.
    pub fn paid_asset(stars: u32, name: &str) -> Asset {
        let full = format!("{}{}_{}", PAID_PREFIX, stars, name);
        Asset::new(format!("id-{}", full), full, Some(10 * 1024 * 1024), PAID_PREFIX)
    }

    /// `count` free assets named `clip-<n>.mp4`.
    pub fn free_assets(count: usize) -> Vec<Asset> {
        (1..=count)
            .map(|n| free_asset(&format!("clip-{}.mp4", n)))
            .collect()
    }
}
