//! # Redis Cache Store
//!
//! Redis-backed store sharing a `ConnectionManager`; keys are namespaced with the
//! configured prefix.

use super::CacheStore;
use crate::caching::{CacheError, CacheResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, AsyncIter, Client};
use std::time::Duration;
use tracing::{debug, info};

/// Redis cache implementation
pub struct RedisCache {
    connection_manager: ConnectionManager,
    key_prefix: String,
}

impl RedisCache {
    /// Create a new Redis cache
    pub async fn new(url: &str, key_prefix: impl Into<String>) -> CacheResult<Self> {
        let client = Client::open(url).map_err(CacheError::Redis)?;
        let connection_manager = ConnectionManager::new(client).await.map_err(CacheError::Redis)?;

        info!("Redis cache connected");
        Ok(Self {
            connection_manager,
            key_prefix: key_prefix.into(),
        })
    }

    /// Get the full cache key with prefix
    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.connection_manager.clone();
        let value: Option<Vec<u8>> = conn.get(self.full_key(key)).await?;
        debug!(key, hit = value.is_some(), "Redis cache lookup");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.full_key(key), value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection_manager.clone();
        let deleted: i64 = conn.del(self.full_key(key)).await?;
        Ok(deleted > 0)
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut scan_conn = self.connection_manager.clone();
        let pattern = format!("{}*", self.full_key(prefix));

        let mut keys = Vec::new();
        {
            let mut iter: AsyncIter<String> = scan_conn.scan_match(&pattern).await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection_manager.clone();
        let deleted: u64 = conn.del(&keys).await?;
        debug!(prefix, deleted, "Redis cache prefix invalidated");
        Ok(deleted)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
