//! Redis-backed cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;

use super::error::CacheError;
use super::traits::DedupCache;

/// Cache backed by a remote Redis (or Valkey) instance.
///
/// The connection is established once, in [`RedisCache::connect`]. If that
/// fails the instance stays in degraded mode for its whole lifetime.
pub struct RedisCache {
    conn: Option<MultiplexedConnection>,
    endpoint: String,
}

impl RedisCache {
    /// Connect and verify the connection with `PING`, degrading on failure.
    pub async fn connect(config: &CacheConfig) -> Self {
        let endpoint = format!("{}:{}/{}", config.host, config.port, config.db);

        match Self::try_connect(config).await {
            Ok(conn) => {
                info!(endpoint = %endpoint, "Connected to dedup cache");
                Self {
                    conn: Some(conn),
                    endpoint,
                }
            }
            Err(e) => {
                warn!(
                    endpoint = %endpoint,
                    kind = %e.kind(),
                    "Dedup cache unavailable, continuing without it: {}",
                    e
                );
                Self::degraded(endpoint)
            }
        }
    }

    /// A cache that never connected.
    pub fn degraded(endpoint: impl Into<String>) -> Self {
        Self {
            conn: None,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Connection URL with percent-encoded credentials.
    fn connection_url(config: &CacheConfig) -> String {
        format!(
            "redis://{}:{}@{}:{}/{}",
            urlencoding::encode(&config.username),
            urlencoding::encode(&config.password),
            config.host,
            config.port,
            config.db
        )
    }

    async fn try_connect(config: &CacheConfig) -> Result<MultiplexedConnection, CacheError> {
        let client = redis::Client::open(Self::connection_url(config).as_str())?;
        let timeout = Duration::from_secs(config.connect_timeout_secs);

        let mut conn = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CacheError::Timeout {
                timeout_secs: config.connect_timeout_secs,
            })??;

        let pong: String = tokio::time::timeout(timeout, redis::cmd("PING").query_async(&mut conn))
            .await
            .map_err(|_| CacheError::Timeout {
                timeout_secs: config.connect_timeout_secs,
            })??;
        debug!(reply = %pong, "Dedup cache answered PING");

        Ok(conn)
    }
}

#[async_trait]
impl DedupCache for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone()?;

        let result: Result<Option<String>, redis::RedisError> = conn.get(key).await;
        match result {
            Ok(Some(value)) if !value.is_empty() => {
                debug!(key = key, value = %value, "Cache hit");
                Some(value)
            }
            Ok(_) => {
                debug!(key = key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key = key, "Cache lookup failed: {}", CacheError::from(e));
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };

        let result: Result<(), redis::RedisError> = conn.set(key, value).await;
        match result {
            Ok(()) => {
                info!(key = key, value = value, "Cache entry stored");
                true
            }
            Err(e) => {
                warn!(key = key, "Cache write failed: {}", CacheError::from(e));
                false
            }
        }
    }
}
