//! Access-token signing and local verification
//!
//! Access tokens are stateless HS256 JWTs. Every service that authenticates
//! requests holds the same shared secret and verifies tokens without any
//! network or store round trip:
//! - Signature check against the shared secret
//! - `exp` must be strictly in the future (zero leeway)
//! - `jti` makes every minted token a distinct string
//!
//! Revocation is not possible for an individual access token; sessions are
//! revoked through the refresh token held by the identity service.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub mod secret_validation;

pub use secret_validation::{validate_secret_strength, SecretStrength};

const BEARER_SCHEME: &str = "Bearer";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Grants unconditional authorization at capability guards
    pub is_superuser: bool,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    /// Parse the subject as a user id
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| TokenError::Malformed("subject is not a valid user id".to_string()))
    }
}

/// Freshly signed access token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    /// Seconds until expiry, relative to issuance
    pub fn expires_in(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Signing secret rejected: {0}")]
    WeakSecret(String),
}

impl TokenError {
    /// True for every failure a caller must report as "unauthenticated".
    /// The variants stay distinct only for internal logging.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            TokenError::Malformed(_) | TokenError::Expired | TokenError::BadSignature
        )
    }
}

/// Shared-secret key material for minting and verifying access tokens
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeys").finish_non_exhaustive()
    }
}

impl JwtKeys {
    /// Build keys from the out-of-band provisioned secret.
    ///
    /// Weak secrets are rejected; acceptable-but-short secrets are logged.
    pub fn from_secret(secret: &str) -> Result<Self, TokenError> {
        match validate_secret_strength(secret) {
            SecretStrength::Weak => {
                return Err(TokenError::WeakSecret(
                    "JWT secret must be at least 32 bytes of high-entropy material".to_string(),
                ))
            }
            SecretStrength::Acceptable => {
                warn!("JWT secret is acceptable but shorter than the recommended 64 bytes");
            }
            SecretStrength::Strong => {}
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Sign an access token for `user_id` valid for `ttl` from now
    pub fn sign(
        &self,
        user_id: Uuid,
        is_superuser: bool,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| TokenError::Signing("access token ttl out of range".to_string()))?;

        let claims = Claims {
            sub: user_id.to_string(),
            is_superuser,
            iat: now,
            exp: now + ttl_secs,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a compact token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        // jsonwebtoken accepts exp == now; a token expiring this second is already dead
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        data.claims.user_id()?;

        Ok(data.claims)
    }

    /// Verify the value of an `Authorization` header (`Bearer <token>`)
    pub fn verify_bearer(&self, header_value: &str) -> Result<Claims, TokenError> {
        let token = parse_bearer(header_value)
            .ok_or_else(|| TokenError::Malformed("expected Bearer scheme".to_string()))?;

        self.verify(token).map_err(|e| {
            debug!(error = %e, "Access token rejected");
            e
        })
    }
}

/// Split `Bearer <token>` into the token part. The scheme match is
/// case-insensitive; an empty token is rejected.
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
