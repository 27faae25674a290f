use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::stores::CacheStore;
use super::CacheResult;

/// JSON view over a [`CacheStore`]
#[derive(Clone)]
pub struct CacheService {
    store: Arc<dyn CacheStore>,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Cached value for `key`
    ///
    /// Store failures and undecodable entries are logged and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                metrics::counter!("cache_lookups_total", "result" => "miss").increment(1);
                return None;
            }
            Err(e) => {
                warn!(key, backend = self.backend(), error = %e, "Cache read failed, treating as miss");
                metrics::counter!("cache_lookups_total", "result" => "error").increment(1);
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key, "Cache hit");
                metrics::counter!("cache_lookups_total", "result" => "hit").increment(1);
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "Dropping undecodable cache entry");
                if let Err(e) = self.store.delete(key).await {
                    warn!(key, backend = self.backend(), error = %e, "Cache delete failed");
                }
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.set(key, &bytes, ttl).await
    }

    /// Write that only logs on failure
    pub async fn set_quietly<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        if let Err(e) = self.set(key, value, ttl).await {
            warn!(key, backend = self.backend(), error = %e, "Cache write failed");
        }
    }

    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.store.delete(key).await
    }

    /// Read and delete in one go; used for single-use values like OAuth state
    pub async fn take<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await;
        if let Err(e) = self.store.delete(key).await {
            warn!(key, error = %e, "Cache delete failed");
        }
        value
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let removed = self.store.delete_prefix(prefix).await?;
        debug!(prefix, removed, "Cache prefix invalidated");
        Ok(removed)
    }
}
