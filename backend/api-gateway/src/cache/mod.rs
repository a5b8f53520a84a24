//! Short-lived key/value cache shared by the capability guards and the
//! user-info route.
//!
//! Values are JSON strings. A backend is chosen once at startup: Redis when
//! `REDIS_URL` is configured, otherwise a process-local map.

use async_trait::async_trait;
use redis_utils::RedisCallError;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

pub mod memory;
pub mod redis;

pub use memory::MemoryCache;
pub use self::redis::RedisCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(#[from] RedisCallError),

    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key` for `ttl`, replacing any existing entry
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Read and decode a cached value.
///
/// Cache errors and undecodable entries both count as a miss; an
/// undecodable entry is also evicted.
pub async fn read_json<T: DeserializeOwned>(cache: &dyn CacheBackend, key: &str) -> Option<T> {
    let raw = match cache.get(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = %key, "Cache miss");
            return None;
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Cache read failed");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => {
            debug!(key = %key, "Cache hit");
            Some(value)
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Undecodable cache entry, evicting");
            if let Err(e) = cache.delete(key).await {
                warn!(key = %key, error = %e, "Failed to evict cache entry");
            }
            None
        }
    }
}

/// Encode and store a value. Failures are logged and otherwise ignored.
pub async fn write_json<T: Serialize + ?Sized>(
    cache: &dyn CacheBackend,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to encode cache entry");
            return;
        }
    };

    if let Err(e) = cache.set(key, &raw, ttl).await {
        warn!(key = %key, error = %e, "Cache write failed");
    }
}
