/// User database operations for identity-service
use crate::error::{IdentityError, Result};
use crate::models::User;
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

/// Credential store seam used by the token issuer
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Insert a new user. A duplicate email surfaces as
    /// [`IdentityError::AlreadyExists`] from the unique index, never from a
    /// pre-check.
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User>;
}

/// PostgreSQL-backed credential store
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T>
    where
        F: std::future::Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match resilience::with_deadline(self.timeout, op).await {
            Ok(value) => Ok(value),
            Err(resilience::TimeoutError::Failed(e)) => Err(e.into()),
            Err(resilience::TimeoutError::Elapsed(d)) => {
                tracing::error!(timeout_ms = d.as_millis() as u64, "Credential store timed out");
                Err(IdentityError::Unavailable("credential store timed out".to_string()))
            }
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.bounded(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.bounded(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        self.bounded(
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, email, password_hash, first_name, last_name)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(password_hash)
            .bind(first_name)
            .bind(last_name)
            .fetch_one(&self.pool),
        )
        .await
    }
}
