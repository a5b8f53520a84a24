// Shared helpers for gateway integration tests.
#![allow(dead_code)]

use api_gateway::authz::{AccessError, CourseAccess, Gatekeeper};
use api_gateway::cache::{CacheBackend, MemoryCache};
use api_gateway::clients::ServiceClients;
use api_gateway::config::UpstreamEndpoints;
use api_gateway::proxy::Upstreams;
use api_gateway::GatewayState;
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use jwt_security::{Claims, JwtKeys};
use resilience::Deadlines;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const TEST_SECRET: &str = "Zq8#Lm2!Rv7pWx4$Tn9@Kd3^Hs6&Jf1*Bg5(";

/// Nothing listens here; connections are refused immediately
pub const DEAD_ENDPOINT: &str = "http://127.0.0.1:1";

pub fn keys() -> JwtKeys {
    JwtKeys::from_secret(TEST_SECRET).unwrap()
}

pub fn bearer(user_id: Uuid, is_superuser: bool) -> String {
    let issued = keys()
        .sign(user_id, is_superuser, Duration::from_secs(300))
        .unwrap();
    format!("Bearer {}", issued.token)
}

/// Sign arbitrary claims, bypassing `JwtKeys` checks
pub fn raw_token(sub: &str, exp_offset_secs: i64, secret: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: sub.to_string(),
        is_superuser: false,
        iat: now,
        exp: now + exp_offset_secs,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// Course-access fake that records how often it is asked
#[derive(Default)]
pub struct FakeCourseAccess {
    teachers: Mutex<HashSet<(String, String)>>,
    members: Mutex<HashSet<(String, String)>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    pub teacher_calls: AtomicUsize,
    pub member_calls: AtomicUsize,
}

impl FakeCourseAccess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_teacher(&self, user_id: Uuid, course_id: &str) {
        self.teachers
            .lock()
            .unwrap()
            .insert((user_id.to_string(), course_id.to_string()));
    }

    pub fn add_member(&self, user_id: Uuid, course_id: &str) {
        self.members
            .lock()
            .unwrap()
            .insert((user_id.to_string(), course_id.to_string()));
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn total_calls(&self) -> usize {
        self.teacher_calls.load(Ordering::SeqCst) + self.member_calls.load(Ordering::SeqCst)
    }

    async fn answer(
        &self,
        set: &Mutex<HashSet<(String, String)>>,
        user_id: &str,
        course_id: &str,
    ) -> Result<bool, AccessError> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AccessError::Rpc(tonic::Status::unavailable(
                "course service down",
            )));
        }
        Ok(set
            .lock()
            .unwrap()
            .contains(&(user_id.to_string(), course_id.to_string())))
    }
}

#[async_trait]
impl CourseAccess for FakeCourseAccess {
    async fn is_teacher(
        &self,
        user_id: &str,
        course_id: &str,
        _correlation_id: &str,
    ) -> Result<bool, AccessError> {
        self.teacher_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.teachers, user_id, course_id).await
    }

    async fn is_member(
        &self,
        user_id: &str,
        course_id: &str,
        _correlation_id: &str,
    ) -> Result<bool, AccessError> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.members, user_id, course_id).await
    }
}

pub fn gatekeeper(access: Arc<dyn CourseAccess>) -> Arc<Gatekeeper> {
    Arc::new(Gatekeeper::new(access, Duration::from_millis(500)))
}

/// Gateway state whose gRPC services and upstreams are all unreachable
pub fn dead_state(cache: Arc<dyn CacheBackend>) -> GatewayState {
    let deadlines = Deadlines {
        rpc: Duration::from_millis(300),
        short_rpc: Duration::from_millis(300),
        authz_check: Duration::from_millis(300),
        upstream: Duration::from_millis(500),
        store: Duration::from_millis(100),
    };

    GatewayState {
        clients: ServiceClients::new(DEAD_ENDPOINT, DEAD_ENDPOINT, &deadlines).unwrap(),
        upstreams: Upstreams::new(
            &UpstreamEndpoints {
                courses: DEAD_ENDPOINT.to_string(),
                lessons: DEAD_ENDPOINT.to_string(),
                tasks: DEAD_ENDPOINT.to_string(),
            },
            deadlines.upstream,
        )
        .unwrap(),
        cache,
        user_info_ttl: Duration::from_secs(300),
        deadlines,
    }
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new())
}
