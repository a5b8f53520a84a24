//! Access-token authentication middleware
//!
//! Verification is local (shared HMAC secret, no I/O). Every failure mode
//! produces the same bodiless 401; the reason is only logged.

use crate::error::GatewayError;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use jwt_security::{Claims, JwtKeys};
use std::future::{ready, Ready};
use tracing::debug;
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

const MAX_CORRELATION_ID_LEN: usize = 128;

/// Verified caller identity attached to an authenticated request
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub user_id: Uuid,
    pub correlation_id: String,
}

impl AuthContext {
    pub fn is_superuser(&self) -> bool {
        self.claims.is_superuser
    }
}

impl FromRequest for AuthContext {
    type Error = GatewayError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthContext>()
                .cloned()
                .ok_or(GatewayError::Unauthenticated),
        )
    }
}

/// Client-supplied correlation id, or a fresh one when absent or unusable
pub fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= MAX_CORRELATION_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Rejects requests without a valid bearer access token
pub struct Authenticate {
    keys: JwtKeys,
}

impl Authenticate {
    pub fn new(keys: JwtKeys) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service,
            keys: self.keys.clone(),
        }))
    }
}

pub struct AuthenticateMiddleware<S> {
    service: S,
    keys: JwtKeys,
}

impl<S> AuthenticateMiddleware<S> {
    fn verify(&self, req: &ServiceRequest) -> Result<(Claims, Uuid), &'static str> {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .ok_or("missing authorization header")?
            .to_str()
            .map_err(|_| "non-ascii authorization header")?;

        let claims = self.keys.verify_bearer(header).map_err(|e| match e {
            jwt_security::TokenError::Expired => "expired token",
            jwt_security::TokenError::BadSignature => "bad signature",
            _ => "malformed token",
        })?;
        let user_id = claims.user_id().map_err(|_| "malformed subject")?;

        Ok((claims, user_id))
    }
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let correlation_id = correlation_id(req.headers());

        let (claims, user_id) = match self.verify(&req) {
            Ok(verified) => verified,
            Err(reason) => {
                debug!(
                    correlation_id = %correlation_id,
                    path = %req.path(),
                    reason,
                    "Rejected unauthenticated request"
                );
                let response = req
                    .into_response(GatewayError::Unauthenticated.error_response())
                    .map_into_right_body();
                return Box::pin(async move { Ok(response) });
            }
        };

        req.extensions_mut().insert(AuthContext {
            claims,
            user_id,
            correlation_id,
        });

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
