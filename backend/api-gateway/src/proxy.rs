//! Forwarding of guarded routes to the HTTP services that own them.
//!
//! Only content negotiation headers and the bearer token are passed
//! through. Identity headers are always set by the gateway from the verified
//! [`AuthContext`], so a client cannot supply its own.

use crate::config::UpstreamEndpoints;
use crate::error::GatewayError;
use crate::middleware::{AuthContext, CORRELATION_HEADER};
use crate::state::GatewayState;
use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, warn};

const API_PREFIX: &str = "/api/v1";
const PASSTHROUGH_HEADERS: &[&str] = &["content-type", "accept", "authorization"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Courses,
    Lessons,
    Tasks,
}

pub struct Upstreams {
    client: reqwest::Client,
    courses: String,
    lessons: String,
    tasks: String,
}

impl Upstreams {
    pub fn new(endpoints: &UpstreamEndpoints, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self {
            client,
            courses: endpoints.courses.trim_end_matches('/').to_string(),
            lessons: endpoints.lessons.trim_end_matches('/').to_string(),
            tasks: endpoints.tasks.trim_end_matches('/').to_string(),
        })
    }

    fn base(&self, upstream: Upstream) -> &str {
        match upstream {
            Upstream::Courses => &self.courses,
            Upstream::Lessons => &self.lessons,
            Upstream::Tasks => &self.tasks,
        }
    }

    /// Upstream URL for an inbound request: the `/api/v1` prefix is dropped,
    /// the query string kept.
    pub fn target_url(&self, upstream: Upstream, path: &str, query: &str) -> String {
        let path = path.strip_prefix(API_PREFIX).unwrap_or(path);
        if query.is_empty() {
            format!("{}{}", self.base(upstream), path)
        } else {
            format!("{}{}?{}", self.base(upstream), path, query)
        }
    }

    pub async fn forward(
        &self,
        upstream: Upstream,
        req: &HttpRequest,
        body: web::Bytes,
        ctx: &AuthContext,
    ) -> Result<HttpResponse, GatewayError> {
        let url = self.target_url(upstream, req.path(), req.query_string());
        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .map_err(|_| GatewayError::BadRequest("unsupported method".to_string()))?;

        let mut outbound = self
            .client
            .request(method, &url)
            .header("x-user-id", ctx.user_id.to_string())
            .header("x-user-superuser", ctx.is_superuser().to_string())
            .header(CORRELATION_HEADER, ctx.correlation_id.as_str());

        for name in PASSTHROUGH_HEADERS {
            if let Some(value) = req.headers().get(*name).and_then(|v| v.to_str().ok()) {
                outbound = outbound.header(*name, value);
            }
        }

        debug!(
            correlation_id = %ctx.correlation_id,
            upstream = ?upstream,
            url = %url,
            "Forwarding request"
        );

        let response = outbound.body(body.to_vec()).send().await.map_err(|e| {
            warn!(
                correlation_id = %ctx.correlation_id,
                upstream = ?upstream,
                error = %e,
                "Upstream request failed"
            );
            GatewayError::Unavailable(format!("{:?} upstream: {}", upstream, e))
        })?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|e| GatewayError::Internal(format!("upstream status: {}", e)))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("{:?} upstream body: {}", upstream, e)))?;

        let mut builder = HttpResponse::build(status);
        if let Some(content_type) = content_type {
            builder.content_type(content_type);
        }
        Ok(builder.body(bytes.to_vec()))
    }
}

pub async fn forward_courses(
    req: HttpRequest,
    body: web::Bytes,
    ctx: AuthContext,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    state.upstreams.forward(Upstream::Courses, &req, body, &ctx).await
}

pub async fn forward_lessons(
    req: HttpRequest,
    body: web::Bytes,
    ctx: AuthContext,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    state.upstreams.forward(Upstream::Lessons, &req, body, &ctx).await
}

pub async fn forward_tasks(
    req: HttpRequest,
    body: web::Bytes,
    ctx: AuthContext,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    state.upstreams.forward(Upstream::Tasks, &req, body, &ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstreams() -> Upstreams {
        Upstreams::new(
            &UpstreamEndpoints {
                courses: "http://courses:8081/".to_string(),
                lessons: "http://lessons:8082".to_string(),
                tasks: "http://tasks:8083".to_string(),
            },
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_target_url_strips_prefix_and_keeps_query() {
        let up = upstreams();

        assert_eq!(
            up.target_url(Upstream::Courses, "/api/v1/courses/update", ""),
            "http://courses:8081/courses/update"
        );
        assert_eq!(
            up.target_url(Upstream::Tasks, "/api/v1/tasks/list", "page=2"),
            "http://tasks:8083/tasks/list?page=2"
        );
        assert_eq!(
            up.target_url(Upstream::Courses, "/api/v1/admin/users", ""),
            "http://courses:8081/admin/users"
        );
    }
}
