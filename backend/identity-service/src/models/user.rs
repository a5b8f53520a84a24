use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// User model - core identity entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Grants unconditional authorization at every capability guard
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input, validated before any store access
#[derive(Debug, Clone, Validate)]
pub struct NewUser {
    #[validate(email(message = "Invalid email format"), length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    pub password: String,
    #[validate(length(max = 100, message = "First name too long"))]
    pub first_name: String,
    #[validate(length(max = 100, message = "Last name too long"))]
    pub last_name: String,
}

impl NewUser {
    /// Trim surrounding whitespace from the email; case is preserved.
    pub fn new(email: &str, password: String, first_name: String, last_name: String) -> Self {
        Self {
            email: email.trim().to_string(),
            password,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
        }
    }
}
