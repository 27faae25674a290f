//! # Caching Module
//!
//! Best-effort cache in front of the product service, also used to hold short-lived
//! OAuth state. Two stores are available:
//! - [`RedisCache`] shares the deployment's Redis and survives gateway restarts
//! - [`InMemoryCache`] keeps everything in process (development, tests)
//!
//! Callers go through [`CacheService`], which handles JSON encoding and turns read
//! failures into misses so that a broken cache never fails a request.

pub mod service;
pub mod stores;

pub use service::CacheService;
pub use stores::{CacheStore, InMemoryCache, RedisCache};

use crate::core::error::GatewayError;

/// Cache operation result
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache store error: {message}")]
    Store { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl From<CacheError> for GatewayError {
    fn from(err: CacheError) -> Self {
        GatewayError::internal(format!("Cache error: {}", err))
    }
}
