/// Per-request context carried explicitly through the service layer
use tonic::Request;
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Typed request context. Built once per RPC from request metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
        }
    }

    /// Read the correlation id placed by the server interceptor, minting a
    /// fresh one if the request bypassed it.
    pub fn from_request<T>(request: &Request<T>) -> Self {
        if let Some(ctx) = request.extensions().get::<RequestContext>() {
            return ctx.clone();
        }

        let correlation_id = request
            .metadata()
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self { correlation_id }
    }
}
