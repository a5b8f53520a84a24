//! Capability decisions for the guarded routes.
//!
//! Fail closed: a course-access check that errors or misses its deadline is
//! a deny (503), never an allow.

use super::course_access::CourseAccess;
use crate::error::GatewayError;
use crate::middleware::AuthContext;
use resilience::{with_deadline, TimeoutError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any valid access token
    Authenticated,
    Superuser,
    /// Teacher of the course named in the request
    Teacher,
    /// Member of the course named in the request; teachers also qualify
    Member,
}

impl Capability {
    /// Whether the decision depends on a course id from the request
    pub fn is_course_scoped(self) -> bool {
        matches!(self, Capability::Teacher | Capability::Member)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Authenticated => "authenticated",
            Capability::Superuser => "superuser",
            Capability::Teacher => "teacher",
            Capability::Member => "member",
        };
        f.write_str(name)
    }
}

pub struct Gatekeeper {
    access: Arc<dyn CourseAccess>,
    check_timeout: Duration,
}

impl Gatekeeper {
    pub fn new(access: Arc<dyn CourseAccess>, check_timeout: Duration) -> Self {
        Self {
            access,
            check_timeout,
        }
    }

    pub async fn authorize(
        &self,
        ctx: &AuthContext,
        capability: Capability,
        course_id: Option<&str>,
    ) -> Result<(), GatewayError> {
        let granted = match capability {
            Capability::Authenticated => true,
            Capability::Superuser => ctx.is_superuser(),
            Capability::Teacher | Capability::Member if ctx.is_superuser() => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    user_id = %ctx.user_id,
                    capability = %capability,
                    "Superuser bypass"
                );
                true
            }
            Capability::Teacher => {
                let course_id = require_course(course_id)?;
                self.check_teacher(ctx, course_id).await?
            }
            Capability::Member => {
                let course_id = require_course(course_id)?;
                self.check_member(ctx, course_id).await?
            }
        };

        if granted {
            Ok(())
        } else {
            info!(
                correlation_id = %ctx.correlation_id,
                user_id = %ctx.user_id,
                capability = %capability,
                course_id = course_id.unwrap_or_default(),
                "Capability denied"
            );
            Err(GatewayError::Forbidden)
        }
    }

    async fn check_teacher(&self, ctx: &AuthContext, course_id: &str) -> Result<bool, GatewayError> {
        let user_id = ctx.user_id.to_string();
        let result = with_deadline(
            self.check_timeout,
            self.access
                .is_teacher(&user_id, course_id, &ctx.correlation_id),
        )
        .await;
        self.settle(ctx, "is_teacher", course_id, result)
    }

    async fn check_member(&self, ctx: &AuthContext, course_id: &str) -> Result<bool, GatewayError> {
        let user_id = ctx.user_id.to_string();
        let result = with_deadline(
            self.check_timeout,
            self.access
                .is_member(&user_id, course_id, &ctx.correlation_id),
        )
        .await;

        if self.settle(ctx, "is_member", course_id, result)? {
            return Ok(true);
        }
        self.check_teacher(ctx, course_id).await
    }

    fn settle<E: fmt::Display>(
        &self,
        ctx: &AuthContext,
        operation: &'static str,
        course_id: &str,
        result: Result<bool, TimeoutError<E>>,
    ) -> Result<bool, GatewayError> {
        match result {
            Ok(allowed) => Ok(allowed),
            Err(TimeoutError::Elapsed(limit)) => {
                warn!(
                    correlation_id = %ctx.correlation_id,
                    user_id = %ctx.user_id,
                    course_id = %course_id,
                    operation,
                    timeout_ms = limit.as_millis() as u64,
                    "Course access check timed out, denying"
                );
                Err(GatewayError::Unavailable(format!(
                    "{} timed out after {:?}",
                    operation, limit
                )))
            }
            Err(TimeoutError::Failed(e)) => {
                warn!(
                    correlation_id = %ctx.correlation_id,
                    user_id = %ctx.user_id,
                    course_id = %course_id,
                    operation,
                    error = %e,
                    "Course access check failed, denying"
                );
                Err(GatewayError::Unavailable(format!("{} failed: {}", operation, e)))
            }
        }
    }
}

fn require_course(course_id: Option<&str>) -> Result<&str, GatewayError> {
    course_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("course_id is required".to_string()))
}
