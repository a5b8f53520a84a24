/// Refresh tokens and the revocable token store
///
/// A refresh token is an opaque random string. Everything it means lives
/// server-side under `refresh_token:{token}` with a store-enforced TTL:
///
/// `issued -> (any number of refreshes) -> revoked by logout | expired by TTL`
///
/// Neither terminal state leads back to `issued`.
use crate::error::{IdentityError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use redis_utils::SharedConnectionManager;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const KEY_PREFIX: &str = "refresh_token";
const TOKEN_BYTES: usize = 32;

/// Stored value for a refresh token. The token itself is only the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    /// Absolute expiry (Unix seconds)
    pub expires_at: i64,
}

impl RefreshTokenRecord {
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// Revocable token store seam
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn put(&self, token: &str, record: &RefreshTokenRecord, ttl: Duration) -> Result<()>;

    async fn get(&self, token: &str) -> Result<Option<RefreshTokenRecord>>;

    /// Deleting an absent key succeeds.
    async fn delete(&self, token: &str) -> Result<()>;
}

/// 32 bytes from the OS CSPRNG, base64url without padding
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Short SHA-256 prefix safe to put in logs
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..6])
}

fn store_key(token: &str) -> String {
    format!("{}:{}", KEY_PREFIX, token)
}

/// Redis-backed revocable token store
#[derive(Clone)]
pub struct RedisRefreshTokenStore {
    redis: SharedConnectionManager,
    timeout: Duration,
}

impl RedisRefreshTokenStore {
    pub fn new(redis: SharedConnectionManager, timeout: Duration) -> Self {
        Self { redis, timeout }
    }
}

#[async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn put(&self, token: &str, record: &RefreshTokenRecord, ttl: Duration) -> Result<()> {
        let value = serde_json::to_string(record)
            .map_err(|e| IdentityError::Internal(format!("Failed to encode token record: {}", e)))?;
        let key = store_key(token);

        let mut conn = redis_utils::connection(&self.redis).await;
        redis_utils::with_timeout(self.timeout, async {
            redis::cmd("SET")
                .arg(&key)
                .arg(&value)
                .arg("EX")
                .arg(ttl.as_secs().max(1))
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await?;

        debug!(
            token = %token_fingerprint(token),
            user_id = %record.user_id,
            "Refresh token stored"
        );
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<RefreshTokenRecord>> {
        let key = store_key(token);

        let mut conn = redis_utils::connection(&self.redis).await;
        let raw: Option<String> = redis_utils::with_timeout(self.timeout, async {
            redis::cmd("GET")
                .arg(&key)
                .query_async::<_, Option<String>>(&mut conn)
                .await
        })
        .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<RefreshTokenRecord>(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(
                    token = %token_fingerprint(token),
                    error = %e,
                    "Corrupt refresh token record, revoking"
                );
                self.delete(token).await?;
                Ok(None)
            }
        }
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let key = store_key(token);

        let mut conn = redis_utils::connection(&self.redis).await;
        redis_utils::with_timeout(self.timeout, async {
            redis::cmd("DEL")
                .arg(&key)
                .query_async::<_, i64>(&mut conn)
                .await
        })
        .await?;

        Ok(())
    }
}
