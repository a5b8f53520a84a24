//! Configuration management for Identity Service
//!
//! Loads settings from environment variables, with a `.env` file honored in
//! development builds.
//!
//! # Example
//!
//! ```no_run
//! use identity_service::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     println!("Access token TTL: {:?}", settings.tokens.access_ttl);
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use tracing::info;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub tokens: TokenSettings,
    pub server: ServerSettings,
}

impl Settings {
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            tokens: TokenSettings::from_env()?,
            server: ServerSettings::from_env()?,
        })
    }
}

/// Credential store (PostgreSQL) settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// Revocable token store (Redis) settings
#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
        })
    }
}

/// Shared HMAC secret for access tokens
#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
}

impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        })
    }
}

/// Token lifetimes and store deadlines
#[derive(Debug, Clone, Copy)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Upper bound on a single credential or token store round trip
    pub store_timeout: Duration,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(30 * 24 * 3600),
            store_timeout: Duration::from_millis(2000),
        }
    }
}

impl TokenSettings {
    fn from_env() -> Result<Self> {
        let access_secs: u64 = env::var("ACCESS_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .context("Invalid ACCESS_TOKEN_TTL_SECS")?;
        let refresh_secs: u64 = env::var("REFRESH_TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "2592000".to_string())
            .parse()
            .context("Invalid REFRESH_TOKEN_TTL_SECS")?;
        let store_ms: u64 = env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .context("Invalid STORE_TIMEOUT_MS")?;

        anyhow::ensure!(access_secs > 0, "ACCESS_TOKEN_TTL_SECS must be positive");
        anyhow::ensure!(
            refresh_secs > access_secs,
            "REFRESH_TOKEN_TTL_SECS must exceed ACCESS_TOKEN_TTL_SECS"
        );

        Ok(Self {
            access_ttl: Duration::from_secs(access_secs),
            refresh_ttl: Duration::from_secs(refresh_secs),
            store_timeout: Duration::from_millis(store_ms),
        })
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "50051".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }
}
