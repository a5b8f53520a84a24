//! Configuration for API Gateway
//!
//! Loads settings from environment variables, with a `.env` file honored
//! for local development.

use anyhow::{Context, Result};
use resilience::Deadlines;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub services: ServiceEndpoints,
    pub upstreams: UpstreamEndpoints,
    pub jwt: JwtConfig,
    pub cache: CacheConfig,
    pub deadlines: Deadlines,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// gRPC services the gateway consumes
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub identity_service: String,
    pub course_service: String,
}

/// HTTP services guarded routes are forwarded to
#[derive(Debug, Clone)]
pub struct UpstreamEndpoints {
    pub courses: String,
    pub lessons: String,
    pub tasks: String,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Absent means the in-process cache is used
    pub redis_url: Option<String>,
    /// How long a capability decision may be served from cache
    pub authz_ttl: Duration,
    pub user_info_ttl: Duration,
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("Invalid {}", name))
}

fn millis(name: &str, default: &str) -> Result<Duration> {
    Ok(Duration::from_millis(parse_var(name, default)?))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("SERVER_PORT", "8080")?,
            },
            services: ServiceEndpoints {
                identity_service: env::var("IDENTITY_SERVICE_URL")
                    .unwrap_or_else(|_| "http://identity-service:50051".to_string()),
                course_service: env::var("COURSE_SERVICE_URL")
                    .unwrap_or_else(|_| "http://course-service:50052".to_string()),
            },
            upstreams: UpstreamEndpoints {
                courses: env::var("COURSES_UPSTREAM_URL")
                    .unwrap_or_else(|_| "http://course-service:8081".to_string()),
                lessons: env::var("LESSONS_UPSTREAM_URL")
                    .unwrap_or_else(|_| "http://lesson-service:8082".to_string()),
                tasks: env::var("TASKS_UPSTREAM_URL")
                    .unwrap_or_else(|_| "http://task-service:8083".to_string()),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            },
            cache: CacheConfig {
                redis_url: env::var("REDIS_URL").ok().filter(|u| !u.is_empty()),
                authz_ttl: Duration::from_secs(parse_var("AUTHZ_CACHE_TTL_SECS", "86400")?),
                user_info_ttl: Duration::from_secs(parse_var("USER_INFO_CACHE_TTL_SECS", "300")?),
            },
            deadlines: Deadlines {
                rpc: millis("RPC_TIMEOUT_MS", "3000")?,
                short_rpc: millis("SHORT_RPC_TIMEOUT_MS", "1000")?,
                authz_check: millis("AUTHZ_CHECK_TIMEOUT_MS", "1000")?,
                upstream: millis("UPSTREAM_TIMEOUT_MS", "10000")?,
                ..Deadlines::default()
            },
        })
    }
}
