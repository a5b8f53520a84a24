use crate::cache::CacheBackend;
use crate::clients::ServiceClients;
use crate::proxy::Upstreams;
use resilience::Deadlines;
use std::sync::Arc;
use std::time::Duration;

/// Shared handler state, registered once as `web::Data`
pub struct GatewayState {
    pub clients: ServiceClients,
    pub upstreams: Upstreams,
    pub cache: Arc<dyn CacheBackend>,
    pub user_info_ttl: Duration,
    pub deadlines: Deadlines,
}
