//! Read-through cache in front of [`CourseAccess`].
//!
//! Keys are `{operation}:{user}:{course}`. Both grants and denials are
//! cached for the configured TTL. Nothing invalidates an entry when the
//! course relationship changes, so a decision can be stale for up to one
//! TTL. Remote failures are never cached.

use super::course_access::{AccessError, CourseAccess};
use crate::cache::{self, CacheBackend};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Relation {
    Teacher,
    Member,
}

impl Relation {
    fn operation(self) -> &'static str {
        match self {
            Relation::Teacher => "is_teacher",
            Relation::Member => "is_member",
        }
    }
}

pub fn cache_key(operation: &str, user_id: &str, course_id: &str) -> String {
    format!("{}:{}:{}", operation, user_id, course_id)
}

pub struct CachedCourseAccess {
    inner: Arc<dyn CourseAccess>,
    cache: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl CachedCourseAccess {
    pub fn new(inner: Arc<dyn CourseAccess>, cache: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    async fn lookup(
        &self,
        relation: Relation,
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> Result<bool, AccessError> {
        let key = cache_key(relation.operation(), user_id, course_id);

        if let Some(allowed) = cache::read_json::<bool>(self.cache.as_ref(), &key).await {
            return Ok(allowed);
        }

        let allowed = match relation {
            Relation::Teacher => {
                self.inner
                    .is_teacher(user_id, course_id, correlation_id)
                    .await?
            }
            Relation::Member => {
                self.inner
                    .is_member(user_id, course_id, correlation_id)
                    .await?
            }
        };

        cache::write_json(self.cache.as_ref(), &key, &allowed, self.ttl).await;
        Ok(allowed)
    }
}

#[async_trait]
impl CourseAccess for CachedCourseAccess {
    async fn is_teacher(
        &self,
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> Result<bool, AccessError> {
        self.lookup(Relation::Teacher, user_id, course_id, correlation_id)
            .await
    }

    async fn is_member(
        &self,
        user_id: &str,
        course_id: &str,
        correlation_id: &str,
    ) -> Result<bool, AccessError> {
        self.lookup(Relation::Member, user_id, course_id, correlation_id)
            .await
    }
}
