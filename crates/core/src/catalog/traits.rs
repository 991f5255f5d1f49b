use async_trait::async_trait;

use super::error::CatalogError;
use super::types::Asset;

/// Lists media assets held in a remote folder.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Returns the name of this catalog implementation.
    fn name(&self) -> &str;

    /// List every media asset in `folder_id`.
    ///
    /// A folder without matching media yields an empty list, not an error.
    async fn list(&self, folder_id: &str) -> Result<Vec<Asset>, CatalogError>;
}
