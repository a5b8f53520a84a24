/// gRPC server implementation for identity-service
///
/// Implements every RPC from identity_service.proto: Register, Login,
/// Refresh, Logout, GetUserInfo.
use crate::context::{RequestContext, CORRELATION_HEADER};
use crate::error::IdentityError;
use crate::models::NewUser;
use crate::services::TokenIssuer;
use tonic::{metadata::MetadataValue, Request, Response, Status};
use tracing::error;
use uuid::Uuid;

// Import generated protobuf types
pub mod campus {
    pub mod identity {
        pub mod v1 {
            tonic::include_proto!("campus.identity.v1");
        }
    }
}

use campus::identity::v1::auth_service_server::AuthService;
use campus::identity::v1::*;

/// Identity service gRPC server
#[derive(Clone)]
pub struct IdentityServiceServer {
    issuer: TokenIssuer,
}

impl IdentityServiceServer {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

fn to_status(ctx: &RequestContext, err: IdentityError) -> Status {
    if matches!(
        err,
        IdentityError::Internal(_) | IdentityError::Unavailable(_)
    ) {
        error!(correlation_id = %ctx.correlation_id, error = %err, "Request failed");
    }
    err.to_status()
}

#[tonic::async_trait]
impl AuthService for IdentityServiceServer {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let ctx = RequestContext::from_request(&request);
        let req = request.into_inner();

        let input = NewUser::new(&req.email, req.password, req.first_name, req.last_name);
        let user_id = self
            .issuer
            .register(&ctx, input)
            .await
            .map_err(|e| to_status(&ctx, e))?;

        Ok(Response::new(RegisterResponse {
            user_id: user_id.to_string(),
        }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let ctx = RequestContext::from_request(&request);
        let req = request.into_inner();

        let outcome = self
            .issuer
            .login(&ctx, &req.email, &req.password)
            .await
            .map_err(|e| to_status(&ctx, e))?;

        Ok(Response::new(LoginResponse {
            user_id: outcome.user_id.to_string(),
            expires_in: outcome.access_token.expires_in(),
            access_token: outcome.access_token.token,
            refresh_token: outcome.refresh_token,
        }))
    }

    async fn refresh(
        &self,
        request: Request<RefreshRequest>,
    ) -> Result<Response<RefreshResponse>, Status> {
        let ctx = RequestContext::from_request(&request);
        let req = request.into_inner();

        let issued = self
            .issuer
            .refresh(&ctx, &req.refresh_token)
            .await
            .map_err(|e| to_status(&ctx, e))?;

        Ok(Response::new(RefreshResponse {
            expires_in: issued.expires_in(),
            access_token: issued.token,
        }))
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        let ctx = RequestContext::from_request(&request);
        let req = request.into_inner();

        self.issuer
            .logout(&ctx, &req.refresh_token)
            .await
            .map_err(|e| to_status(&ctx, e))?;

        Ok(Response::new(LogoutResponse {}))
    }

    async fn get_user_info(
        &self,
        request: Request<GetUserInfoRequest>,
    ) -> Result<Response<UserInfo>, Status> {
        let ctx = RequestContext::from_request(&request);
        let req = request.into_inner();

        let user_id = Uuid::parse_str(&req.user_id)
            .map_err(|_| Status::invalid_argument("Invalid user_id"))?;

        let user = self
            .issuer
            .get_user_info(user_id)
            .await
            .map_err(|e| to_status(&ctx, e))?;

        Ok(Response::new(UserInfo {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_superuser: user.is_superuser,
        }))
    }
}

/// Ensure every request carries `x-correlation-id` and expose it to
/// handlers as a typed [`RequestContext`].
pub fn correlation_interceptor(mut req: Request<()>) -> Result<Request<()>, Status> {
    let existing = req
        .metadata()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let correlation_id = match existing {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            let value = MetadataValue::try_from(id.as_str())
                .map_err(|_| Status::internal("failed to set correlation id"))?;
            req.metadata_mut().insert(CORRELATION_HEADER, value);
            id
        }
    };

    req.extensions_mut()
        .insert(RequestContext::new(correlation_id));
    Ok(req)
}
