use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, ConnectionAddr, IntoConnectionInfo, RedisError};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::{info, warn};

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Failure of a bounded Redis call.
#[derive(Debug, Error)]
pub enum RedisCallError {
    #[error("redis call timed out after {0:?}")]
    Timeout(Duration),

    #[error("redis error: {0}")]
    Redis(#[from] RedisError),
}

/// Redis connection handle shared by every store in a service.
pub struct RedisPool {
    manager: SharedConnectionManager,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;

        let label = match &info.addr {
            ConnectionAddr::Tcp(host, port) => format!("{}:{}", host, port),
            ConnectionAddr::TcpTls { host, port, .. } => format!("{}:{} (tls)", host, port),
            ConnectionAddr::Unix(path) => path.display().to_string(),
        };

        let client = Client::open(info).context("failed to construct Redis client")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        info!("Redis connected at {}", label);

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }
}

/// Run a Redis operation with an upper bound on its duration.
///
/// Callers on the authentication path must never hang on the store; a
/// timeout surfaces as [`RedisCallError::Timeout`] so the caller can fail
/// closed.
pub async fn with_timeout<F, T>(limit: Duration, op: F) -> Result<T, RedisCallError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result.map_err(RedisCallError::from),
        Err(_) => {
            warn!(timeout_ms = limit.as_millis() as u64, "Redis call timed out");
            Err(RedisCallError::Timeout(limit))
        }
    }
}

/// Clone a connection out of the shared manager without holding the lock
/// across the command.
pub async fn connection(manager: &SharedConnectionManager) -> ConnectionManager {
    manager.lock().await.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_through_result() {
        let out = with_timeout(Duration::from_millis(50), async { Ok::<_, RedisError>(7) })
            .await
            .unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn test_with_timeout_maps_redis_error() {
        let err = with_timeout(Duration::from_millis(50), async {
            Err::<(), _>(RedisError::from((redis::ErrorKind::IoError, "down")))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RedisCallError::Redis(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_elapses() {
        let err = with_timeout(Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, RedisError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, RedisCallError::Timeout(_)));
    }
}
