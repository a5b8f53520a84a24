//! Redis-backed cache shared by every gateway replica

use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use redis_utils::SharedConnectionManager;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCache {
    redis: SharedConnectionManager,
    timeout: Duration,
}

impl RedisCache {
    /// Every round trip is bounded by `timeout`
    pub fn new(redis: SharedConnectionManager, timeout: Duration) -> Self {
        Self { redis, timeout }
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = redis_utils::connection(&self.redis).await;
        let value = redis_utils::with_timeout(self.timeout, async {
            redis::cmd("GET")
                .arg(key)
                .query_async::<_, Option<String>>(&mut conn)
                .await
        })
        .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = redis_utils::connection(&self.redis).await;
        redis_utils::with_timeout(self.timeout, async {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl.as_secs().max(1))
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = redis_utils::connection(&self.redis).await;
        redis_utils::with_timeout(self.timeout, async {
            redis::cmd("DEL")
                .arg(key)
                .query_async::<_, i64>(&mut conn)
                .await
        })
        .await?;
        Ok(())
    }
}
