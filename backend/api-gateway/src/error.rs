//! Gateway error taxonomy and its HTTP rendering

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, malformed, expired or forged credentials. Carries no detail.
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Downstream unreachable or timed out
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden => StatusCode::FORBIDDEN,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            GatewayError::BadRequest(msg) => ErrorResponse::with_message("bad_request", msg.clone()),
            GatewayError::Unauthenticated => ErrorResponse::new("unauthenticated"),
            GatewayError::Forbidden => ErrorResponse::new("forbidden"),
            GatewayError::NotFound => ErrorResponse::new("not_found"),
            GatewayError::Conflict(msg) => ErrorResponse::with_message("conflict", msg.clone()),
            GatewayError::Unavailable(detail) => {
                tracing::error!(detail = %detail, "Downstream unavailable");
                ErrorResponse::with_message("unavailable", "Service temporarily unavailable")
            }
            GatewayError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal gateway error");
                ErrorResponse::with_message("internal", "Internal server error")
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<tonic::Status> for GatewayError {
    fn from(status: tonic::Status) -> Self {
        use tonic::Code;

        match status.code() {
            Code::InvalidArgument => GatewayError::BadRequest(status.message().to_string()),
            Code::Unauthenticated => GatewayError::Unauthenticated,
            Code::PermissionDenied => GatewayError::Forbidden,
            Code::NotFound => GatewayError::NotFound,
            Code::AlreadyExists => GatewayError::Conflict(status.message().to_string()),
            Code::Unavailable | Code::DeadlineExceeded => {
                GatewayError::Unavailable(status.message().to_string())
            }
            _ => GatewayError::Internal(format!("{:?}: {}", status.code(), status.message())),
        }
    }
}

impl<E> From<resilience::TimeoutError<E>> for GatewayError
where
    E: Into<GatewayError>,
{
    fn from(err: resilience::TimeoutError<E>) -> Self {
        match err {
            resilience::TimeoutError::Elapsed(d) => {
                GatewayError::Unavailable(format!("deadline of {:?} elapsed", d))
            }
            resilience::TimeoutError::Failed(e) => e.into(),
        }
    }
}
