/// User endpoints
///
/// GET /api/v1/users/me - Profile of the authenticated caller
use actix_web::{web, HttpResponse};
use resilience::with_deadline;

use super::models::UserProfile;
use crate::cache;
use crate::clients::{proto::identity::GetUserInfoRequest, with_correlation};
use crate::error::GatewayError;
use crate::middleware::AuthContext;
use crate::state::GatewayState;

pub fn user_info_key(user_id: &str) -> String {
    format!("user_info:{}", user_id)
}

pub async fn me(
    ctx: AuthContext,
    state: web::Data<GatewayState>,
) -> Result<HttpResponse, GatewayError> {
    let key = user_info_key(&ctx.user_id.to_string());

    if let Some(profile) = cache::read_json::<UserProfile>(state.cache.as_ref(), &key).await {
        return Ok(HttpResponse::Ok().json(profile));
    }

    let mut client = state.clients.identity_client();
    let request = with_correlation(
        GetUserInfoRequest {
            user_id: ctx.user_id.to_string(),
        },
        &ctx.correlation_id,
    );

    let profile = UserProfile::from(
        with_deadline(state.deadlines.short_rpc, client.get_user_info(request))
            .await?
            .into_inner(),
    );

    cache::write_json(state.cache.as_ref(), &key, &profile, state.user_info_ttl).await;

    Ok(HttpResponse::Ok().json(profile))
}
