//! Capability guard middleware
//!
//! Wraps a route with one [`Capability`]. Course-scoped capabilities read
//! `course_id` from the JSON body, then put the body back so the wrapped
//! handler sees it unchanged.

use super::auth::AuthContext;
use crate::authz::{Capability, Gatekeeper};
use crate::error::GatewayError;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use serde_json::Value;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

pub struct RequireCapability {
    gatekeeper: Arc<Gatekeeper>,
    capability: Capability,
}

impl RequireCapability {
    pub fn new(gatekeeper: Arc<Gatekeeper>, capability: Capability) -> Self {
        Self {
            gatekeeper,
            capability,
        }
    }

    pub fn superuser(gatekeeper: Arc<Gatekeeper>) -> Self {
        Self::new(gatekeeper, Capability::Superuser)
    }

    pub fn teacher(gatekeeper: Arc<Gatekeeper>) -> Self {
        Self::new(gatekeeper, Capability::Teacher)
    }

    pub fn member(gatekeeper: Arc<Gatekeeper>) -> Self {
        Self::new(gatekeeper, Capability::Member)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireCapability
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireCapabilityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireCapabilityMiddleware {
            service: Rc::new(service),
            gatekeeper: self.gatekeeper.clone(),
            capability: self.capability,
        }))
    }
}

pub struct RequireCapabilityMiddleware<S> {
    service: Rc<S>,
    gatekeeper: Arc<Gatekeeper>,
    capability: Capability,
}

impl<S, B> Service<ServiceRequest> for RequireCapabilityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gatekeeper = self.gatekeeper.clone();
        let capability = self.capability;

        Box::pin(async move {
            let ctx = req.extensions().get::<AuthContext>().cloned();
            let Some(ctx) = ctx else {
                return Ok(reject(req, GatewayError::Unauthenticated));
            };

            let course_id = if capability.is_course_scoped() {
                match read_course_id(&mut req).await {
                    Ok(id) => Some(id),
                    Err(e) => return Ok(reject(req, e)),
                }
            } else {
                None
            };

            if let Err(e) = gatekeeper
                .authorize(&ctx, capability, course_id.as_deref())
                .await
            {
                return Ok(reject(req, e));
            }

            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}

fn reject<B>(req: ServiceRequest, err: GatewayError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(err.error_response())
        .map_into_right_body()
}

/// Buffer the body, restore it for the handler, and pull out `course_id`
async fn read_course_id(req: &mut ServiceRequest) -> Result<String, GatewayError> {
    let body = req
        .extract::<web::Bytes>()
        .await
        .map_err(|e| GatewayError::BadRequest(format!("unreadable body: {}", e)))?;

    req.set_payload(Payload::from(body.clone()));

    course_id_from_body(&body)
}

/// Accepts `course_id` as a non-empty string or as an integer
pub fn course_id_from_body(body: &[u8]) -> Result<String, GatewayError> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|_| GatewayError::BadRequest("body must be a JSON object".to_string()))?;

    match json.get("course_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        _ => Err(GatewayError::BadRequest("course_id is required".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_id_extraction() {
        assert_eq!(course_id_from_body(br#"{"course_id":"c-1"}"#).unwrap(), "c-1");
        assert_eq!(course_id_from_body(br#"{"course_id":42}"#).unwrap(), "42");
        assert_eq!(
            course_id_from_body(br#"{"course_id":" c-2 ","title":"x"}"#).unwrap(),
            "c-2"
        );
    }

    #[test]
    fn test_course_id_rejections() {
        let cases: [&[u8]; 6] = [
            b"",
            b"not json",
            br#"{"title":"x"}"#,
            br#"{"course_id":""}"#,
            br#"{"course_id":null}"#,
            br#"{"course_id":1.5}"#,
        ];
        for body in cases {
            assert!(matches!(
                course_id_from_body(body),
                Err(GatewayError::BadRequest(_))
            ));
        }
    }
}
