//! Mock distributor for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::distributor::{DeliveryReceipt, DistributeError, Distributor};
use crate::fetcher::StagedFile;

/// Mock implementation of the Distributor trait.
///
/// Every publish is recorded with its caption. Files registered through
/// [`MockDistributor::fail_file`] are rejected with a server error.
#[derive(Debug, Clone, Default)]
pub struct MockDistributor {
    publishes: Arc<RwLock<Vec<(String, Option<String>)>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    invalid: Arc<RwLock<bool>>,
}

impl MockDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish of the file named `file_name`.
    pub async fn fail_file(&self, file_name: &str) {
        self.failing.write().await.insert(file_name.to_string());
    }

    /// Accept `file_name` again after [`MockDistributor::fail_file`].
    pub async fn recover_file(&self, file_name: &str) {
        self.failing.write().await.remove(file_name);
    }

    /// Make `validate` fail.
    pub async fn fail_validation(&self) {
        *self.invalid.write().await = true;
    }

    /// File names and captions of accepted publishes, in call order.
    pub async fn recorded_publishes(&self) -> Vec<(String, Option<String>)> {
        self.publishes.read().await.clone()
    }
}

#[async_trait]
impl Distributor for MockDistributor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn validate(&self) -> Result<(), DistributeError> {
        if *self.invalid.read().await {
            return Err(DistributeError::Api {
                status: 401,
                description: "Unauthorized".to_string(),
            });
        }
        Ok(())
    }

    async fn publish(
        &self,
        file: &StagedFile,
        caption: Option<&str>,
    ) -> Result<DeliveryReceipt, DistributeError> {
        let name = file.file_name();
        if self.failing.read().await.contains(&name) {
            return Err(DistributeError::Api {
                status: 502,
                description: "Bad Gateway".to_string(),
            });
        }

        let mut publishes = self.publishes.write().await;
        publishes.push((name, caption.map(str::to_string)));
        Ok(DeliveryReceipt {
            message_id: publishes.len() as i64,
            chat_id: "@mock".to_string(),
            paid_stars: None,
        })
    }
}
