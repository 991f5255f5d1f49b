//! Mock catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{Asset, CatalogClient, CatalogError};

/// Mock implementation of the CatalogClient trait.
///
/// Returns a configurable asset list, or an error once when one is set.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    assets: Arc<RwLock<Vec<Asset>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
    listed_folders: Arc<RwLock<Vec<String>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the listed assets.
    pub async fn set_assets(&self, assets: Vec<Asset>) {
        *self.assets.write().await = assets;
    }

    /// Make the next `list` call fail.
    pub async fn set_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Folder ids passed to `list`, in call order.
    pub async fn listed_folders(&self) -> Vec<String> {
        self.listed_folders.read().await.clone()
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list(&self, folder_id: &str) -> Result<Vec<Asset>, CatalogError> {
        self.listed_folders.write().await.push(folder_id.to_string());
        if let Some(e) = self.next_error.write().await.take() {
            return Err(e);
        }
        Ok(self.assets.read().await.clone())
    }
}
