use async_trait::async_trait;

use crate::fetcher::StagedFile;

use super::error::DistributeError;
use super::types::DeliveryReceipt;

/// A channel staged files are delivered to.
#[async_trait]
pub trait Distributor: Send + Sync {
    /// Returns the name of this distributor implementation.
    fn name(&self) -> &str;

    /// Check that the channel session and target chats are usable.
    async fn validate(&self) -> Result<(), DistributeError>;

    /// Deliver one file with an optional caption.
    async fn publish(
        &self,
        file: &StagedFile,
        caption: Option<&str>,
    ) -> Result<DeliveryReceipt, DistributeError>;
}
