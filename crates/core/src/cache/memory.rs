//! In-process cache.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::DedupCache;

/// Cache backed by a `HashMap`. Lives only as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl DedupCache for InMemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .await
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        true
    }
}
