//! Trait definitions for the cache module.

use async_trait::async_trait;

/// Key/value store for "already processed" markers.
///
/// Implementations must not return errors: an unavailable store answers
/// `None` to every `get` and `false` to every `set`.
#[async_trait]
pub trait DedupCache: Send + Sync {
    /// Returns the name of this cache implementation.
    fn name(&self) -> &str;

    /// Whether the backing store is reachable.
    fn is_connected(&self) -> bool;

    /// Look up a key. Empty values are reported as absent.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value, overwriting any previous one. Returns whether it was stored.
    async fn set(&self, key: &str, value: &str) -> bool;
}
