/// Authentication API endpoints
///
/// POST /api/v1/auth/register - Register new user
/// POST /api/v1/auth/login - Login, returns access + refresh token
/// POST /api/v1/auth/refresh - Mint a new access token
/// POST /api/v1/auth/logout - Revoke a refresh token
use actix_web::{web, HttpRequest, HttpResponse};
use resilience::with_deadline;
use tracing::info;

use super::models::{
    LoginRequest, LoginResponse, LogoutRequest, RefreshTokenRequest, RefreshTokenResponse,
    RegisterRequest, RegisterResponse,
};
use crate::clients::{
    proto::identity::{
        LoginRequest as GrpcLoginRequest, LogoutRequest as GrpcLogoutRequest,
        RefreshRequest as GrpcRefreshRequest, RegisterRequest as GrpcRegisterRequest,
    },
    with_correlation,
};
use crate::error::GatewayError;
use crate::middleware::correlation_id;
use crate::state::GatewayState;

const TOKEN_TYPE: &str = "Bearer";

pub async fn register(
    http: HttpRequest,
    req: web::Json<RegisterRequest>,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let correlation_id = correlation_id(http.headers());
    let req = req.into_inner();

    let mut client = state.clients.identity_client();
    let request = with_correlation(
        GrpcRegisterRequest {
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
        },
        &correlation_id,
    );

    let response = with_deadline(state.deadlines.rpc, client.register(request))
        .await?
        .into_inner();

    info!(correlation_id = %correlation_id, user_id = %response.user_id, "User registered");

    Ok(HttpResponse::Created().json(RegisterResponse {
        user_id: response.user_id,
    }))
}

pub async fn login(
    http: HttpRequest,
    req: web::Json<LoginRequest>,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let correlation_id = correlation_id(http.headers());
    let req = req.into_inner();

    let mut client = state.clients.identity_client();
    let request = with_correlation(
        GrpcLoginRequest {
            email: req.email,
            password: req.password,
        },
        &correlation_id,
    );

    let response = with_deadline(state.deadlines.rpc, client.login(request))
        .await?
        .into_inner();

    Ok(HttpResponse::Ok().json(LoginResponse {
        user_id: response.user_id,
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        token_type: TOKEN_TYPE,
        expires_in: response.expires_in,
    }))
}

pub async fn refresh(
    http: HttpRequest,
    req: web::Json<RefreshTokenRequest>,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let correlation_id = correlation_id(http.headers());

    let mut client = state.clients.identity_client();
    let request = with_correlation(
        GrpcRefreshRequest {
            refresh_token: req.into_inner().refresh_token,
        },
        &correlation_id,
    );

    let response = with_deadline(state.deadlines.short_rpc, client.refresh(request))
        .await?
        .into_inner();

    Ok(HttpResponse::Ok().json(RefreshTokenResponse {
        access_token: response.access_token,
        token_type: TOKEN_TYPE,
        expires_in: response.expires_in,
    }))
}

pub async fn logout(
    http: HttpRequest,
    req: web::Json<LogoutRequest>,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let correlation_id = correlation_id(http.headers());

    let mut client = state.clients.identity_client();
    let request = with_correlation(
        GrpcLogoutRequest {
            refresh_token: req.into_inner().refresh_token,
        },
        &correlation_id,
    );

    with_deadline(state.deadlines.short_rpc, client.logout(request)).await?;

    Ok(HttpResponse::NoContent().finish())
}
