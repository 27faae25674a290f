//! # Cache Stores Module
//!
//! Key/value stores behind [`CacheService`](crate::caching::CacheService): Redis in
//! production, an in-process map for development and tests. Neither implements an
//! eviction policy; entries simply expire.

pub mod memory;
pub mod redis_store;

pub use memory::InMemoryCache;
pub use redis_store::RedisCache;

use super::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Trait for cache store implementations
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value in the cache with TTL
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Delete a value from the cache
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Delete every key starting with `prefix`, returns how many were removed
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64>;

    /// Backend name for logs
    fn name(&self) -> &'static str;
}
