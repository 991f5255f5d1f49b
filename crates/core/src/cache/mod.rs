//! Deduplication cache recording which assets were already processed.
//!
//! The cache never fails a run. When the backing store is unreachable at
//! construction time the cache degrades to a no-op: `get` reports every key
//! as absent and `set` reports failure, so the pipeline treats the store as
//! empty and may do duplicate work instead of stopping.

mod error;
mod memory;
mod redis_cache;
mod traits;

pub use error::CacheError;
pub use memory::InMemoryCache;
pub use redis_cache::RedisCache;
pub use traits::DedupCache;

/// Key namespace for staged files already pushed to the distribution channel.
pub const DISTRIBUTED_PREFIX: &str = "distributed:";

/// Cache key marking a staged file as distributed.
pub fn distributed_key(file_name: &str) -> String {
    format!("{}{}", DISTRIBUTED_PREFIX, file_name)
}

/// Human-readable marker stored as the value of a processed asset.
pub fn processed_marker(prefix: &str, date: chrono::NaiveDate) -> String {
    format!("{} {}", prefix, date.format("%Y-%m-%d"))
}
