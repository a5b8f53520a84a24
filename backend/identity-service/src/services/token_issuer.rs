/// Token Issuer
///
/// Owns the session lifecycle:
/// - Register: hash and persist credentials
/// - Login: verify password, mint refresh token (stateful) + access token (stateless)
/// - Refresh: mint a new access token from a live refresh token
/// - Logout: revoke a refresh token (idempotent)
///
/// Store writes are single round trips. A login whose refresh token was
/// stored but whose access token could not be signed is a failed login; the
/// stored record is left for its TTL to collect.
use crate::config::TokenSettings;
use crate::context::RequestContext;
use crate::db::UserRepository;
use crate::error::{IdentityError, Result};
use crate::models::{NewUser, User};
use crate::security::password::{self, verify_against_dummy};
use crate::security::{
    generate_refresh_token, token_fingerprint, RefreshTokenRecord, RefreshTokenStore,
};
use chrono::Utc;
use jwt_security::{IssuedToken, JwtKeys};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Tokens handed back by a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user_id: Uuid,
    pub access_token: IssuedToken,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    users: Arc<dyn UserRepository>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    keys: JwtKeys,
    settings: TokenSettings,
}

impl TokenIssuer {
    pub fn new(
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        keys: JwtKeys,
        settings: TokenSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            keys,
            settings,
        }
    }

    pub async fn register(&self, ctx: &RequestContext, input: NewUser) -> Result<Uuid> {
        input.validate()?;

        let plain = input.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
            .await
            .map_err(|e| IdentityError::Internal(format!("Hashing task failed: {}", e)))??;

        let user = self
            .users
            .create(
                &input.email,
                &password_hash,
                &input.first_name,
                &input.last_name,
            )
            .await?;

        info!(
            correlation_id = %ctx.correlation_id,
            user_id = %user.id,
            "User registered"
        );
        Ok(user.id)
    }

    pub async fn login(
        &self,
        ctx: &RequestContext,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(IdentityError::InvalidArgument(
                "Email and password are required".to_string(),
            ));
        }

        let user = match self.users.find_by_email(email).await? {
            Some(user) => user,
            None => {
                let plain = password.to_string();
                let _ = tokio::task::spawn_blocking(move || verify_against_dummy(&plain)).await;
                info!(correlation_id = %ctx.correlation_id, "Login failed");
                return Err(IdentityError::InvalidCredentials);
            }
        };

        if !self.check_password(&user, password).await? {
            info!(
                correlation_id = %ctx.correlation_id,
                user_id = %user.id,
                "Login failed"
            );
            return Err(IdentityError::InvalidCredentials);
        }

        let expires_at = i64::try_from(self.settings.refresh_ttl.as_secs())
            .ok()
            .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
            .ok_or_else(|| IdentityError::Internal("Refresh token TTL out of range".into()))?;

        let refresh_token = generate_refresh_token();
        let record = RefreshTokenRecord {
            user_id: user.id,
            expires_at,
        };
        self.refresh_tokens
            .put(&refresh_token, &record, self.settings.refresh_ttl)
            .await?;

        let access_token = self
            .keys
            .sign(user.id, user.is_superuser, self.settings.access_ttl)?;

        info!(
            correlation_id = %ctx.correlation_id,
            user_id = %user.id,
            refresh = %token_fingerprint(&refresh_token),
            "Login succeeded"
        );

        Ok(LoginOutcome {
            user_id: user.id,
            access_token,
            refresh_token,
        })
    }

    /// Mint a fresh access token. The refresh token is not rotated and stays
    /// valid until logout or expiry.
    pub async fn refresh(&self, ctx: &RequestContext, refresh_token: &str) -> Result<IssuedToken> {
        if refresh_token.is_empty() {
            return Err(IdentityError::InvalidToken);
        }

        let fingerprint = token_fingerprint(refresh_token);
        let record = self
            .refresh_tokens
            .get(refresh_token)
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        if record.is_expired_at(Utc::now().timestamp()) {
            warn!(
                correlation_id = %ctx.correlation_id,
                refresh = %fingerprint,
                "Refresh token past its stored expiry"
            );
            if let Err(e) = self.refresh_tokens.delete(refresh_token).await {
                warn!(error = %e, refresh = %fingerprint, "Failed to evict expired refresh token");
            }
            return Err(IdentityError::InvalidToken);
        }

        // Re-read the user so flag changes since login take effect
        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        let access_token = self
            .keys
            .sign(user.id, user.is_superuser, self.settings.access_ttl)?;

        info!(
            correlation_id = %ctx.correlation_id,
            user_id = %user.id,
            refresh = %fingerprint,
            "Access token refreshed"
        );
        Ok(access_token)
    }

    /// Revoke a refresh token. Unknown and already-revoked tokens succeed.
    pub async fn logout(&self, ctx: &RequestContext, refresh_token: &str) -> Result<()> {
        if refresh_token.is_empty() {
            return Ok(());
        }

        self.refresh_tokens.delete(refresh_token).await?;

        info!(
            correlation_id = %ctx.correlation_id,
            refresh = %token_fingerprint(refresh_token),
            "Refresh token revoked"
        );
        Ok(())
    }

    pub async fn get_user_info(&self, user_id: Uuid) -> Result<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(IdentityError::NotFound)
    }

    async fn check_password(&self, user: &User, candidate: &str) -> Result<bool> {
        let hash = user.password_hash.clone();
        let plain = candidate.to_string();

        tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
            .await
            .map_err(|e| IdentityError::Internal(format!("Verification task failed: {}", e)))?
    }
}
