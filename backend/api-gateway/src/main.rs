use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use api_gateway::{
    authz::{CachedCourseAccess, CourseAccess, Gatekeeper, GrpcCourseAccess},
    cache::{CacheBackend, MemoryCache, RedisCache},
    clients::ServiceClients,
    config::Config,
    proxy::Upstreams,
    rest_api, GatewayState,
};
use jwt_security::JwtKeys;
use redis_utils::RedisPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const MEMORY_CACHE_SWEEP: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,api_gateway=debug".into()),
        )
        .with_target(false)
        .json()
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Starting API Gateway on {}:{}", config.server.host, config.server.port);

    // Same secret the identity service signs with
    let keys = JwtKeys::from_secret(&config.jwt.secret).context("Invalid JWT_SECRET")?;

    let clients = ServiceClients::new(
        &config.services.identity_service,
        &config.services.course_service,
        &config.deadlines,
    )
    .context("Invalid gRPC service endpoint")?;
    info!(
        identity = %config.services.identity_service,
        course = %config.services.course_service,
        "gRPC clients initialized (lazy connect)"
    );

    let cache: Arc<dyn CacheBackend> = match &config.cache.redis_url {
        Some(url) => {
            let pool = RedisPool::connect(url)
                .await
                .context("Failed to connect to Redis")?;
            Arc::new(RedisCache::new(pool.manager(), config.deadlines.store))
        }
        None => {
            warn!("REDIS_URL not set, using in-process cache; decisions are not shared across replicas");
            let memory = MemoryCache::new();
            let _sweeper = memory.spawn_sweeper(MEMORY_CACHE_SWEEP);
            Arc::new(memory)
        }
    };
    info!(
        authz_ttl_secs = config.cache.authz_ttl.as_secs(),
        user_info_ttl_secs = config.cache.user_info_ttl.as_secs(),
        "Cache configured"
    );

    let course_access: Arc<dyn CourseAccess> = Arc::new(CachedCourseAccess::new(
        Arc::new(GrpcCourseAccess::new(clients.clone())),
        cache.clone(),
        config.cache.authz_ttl,
    ));
    let gatekeeper = Arc::new(Gatekeeper::new(
        course_access,
        config.deadlines.authz_check,
    ));

    let upstreams = Upstreams::new(&config.upstreams, config.deadlines.upstream)?;

    let state = web::Data::new(GatewayState {
        clients,
        upstreams,
        cache,
        user_info_ttl: config.cache.user_info_ttl,
        deadlines: config.deadlines,
    });

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("API Gateway listening on http://{}", bind_addr);

    // actix installs SIGINT/SIGTERM handlers and drains in-flight requests
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(|cfg| rest_api::configure(cfg, keys.clone(), gatekeeper.clone()))
    })
    .shutdown_timeout(30)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await
    .context("HTTP server error")?;

    info!("API Gateway stopped");
    Ok(())
}
