/// Security primitives for identity-service
///
/// - **password**: Argon2id hashing and constant-time verification
/// - **refresh_tokens**: opaque refresh tokens and their revocable store
pub mod password;
pub mod refresh_tokens;

pub use password::{hash_password, verify_password};
pub use refresh_tokens::{
    generate_refresh_token, token_fingerprint, RedisRefreshTokenStore, RefreshTokenRecord,
    RefreshTokenStore,
};
