use thiserror::Error;
use tonic::{Code, Status};

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown email and wrong password both map here
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token missing, revoked, expired or pointing at a deleted user
    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    AlreadyExists,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Convert to gRPC Status for wire protocol
    pub fn to_status(&self) -> Status {
        match self {
            IdentityError::InvalidArgument(msg) => Status::new(Code::InvalidArgument, msg.clone()),
            IdentityError::InvalidCredentials => {
                Status::new(Code::Unauthenticated, "Invalid credentials")
            }
            IdentityError::InvalidToken => Status::new(Code::Unauthenticated, "Invalid token"),
            IdentityError::NotFound => Status::new(Code::NotFound, "User not found"),
            IdentityError::AlreadyExists => {
                Status::new(Code::AlreadyExists, "Email already exists")
            }
            IdentityError::Unavailable(_) => {
                Status::new(Code::Unavailable, "Service temporarily unavailable")
            }
            IdentityError::Internal(_) => {
                // Don't leak internal details
                Status::new(Code::Internal, "Internal server error")
            }
        }
    }
}

// Conversions from store error types
impl From<sqlx::Error> for IdentityError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return IdentityError::AlreadyExists;
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                tracing::error!(error = %err, "Database unavailable");
                IdentityError::Unavailable(err.to_string())
            }
            other => {
                tracing::error!(error = %other, "Database error");
                IdentityError::Internal(other.to_string())
            }
        }
    }
}

impl From<redis_utils::RedisCallError> for IdentityError {
    fn from(err: redis_utils::RedisCallError) -> Self {
        tracing::error!(error = %err, "Token store error");
        let unavailable = match &err {
            redis_utils::RedisCallError::Timeout(_) => true,
            redis_utils::RedisCallError::Redis(e) => e.is_connection_dropped() || e.is_io_error(),
        };

        if unavailable {
            IdentityError::Unavailable(err.to_string())
        } else {
            IdentityError::Internal(err.to_string())
        }
    }
}

impl From<jwt_security::TokenError> for IdentityError {
    fn from(err: jwt_security::TokenError) -> Self {
        tracing::error!(error = %err, "Access token signing failed");
        IdentityError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for IdentityError {
    fn from(err: validator::ValidationErrors) -> Self {
        IdentityError::InvalidArgument(err.to_string())
    }
}

// gRPC Status conversion
impl From<IdentityError> for Status {
    fn from(err: IdentityError) -> Self {
        err.to_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_unauthenticated() {
        assert_eq!(IdentityError::InvalidCredentials.to_status().code(), Code::Unauthenticated);
        assert_eq!(IdentityError::InvalidToken.to_status().code(), Code::Unauthenticated);
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let status = IdentityError::Internal("connection string postgres://secret".into()).to_status();
        assert_eq!(status.code(), Code::Internal);
        assert!(!status.message().contains("secret"));

        let status = IdentityError::Unavailable("redis at 10.0.0.3".into()).to_status();
        assert_eq!(status.code(), Code::Unavailable);
        assert!(!status.message().contains("10.0.0.3"));
    }

    #[test]
    fn test_signing_failure_is_internal() {
        let err: IdentityError = jwt_security::TokenError::Signing("bad key".into()).into();
        assert!(matches!(err, IdentityError::Internal(_)));
    }
}
