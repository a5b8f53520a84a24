// Shared in-memory fakes for the credential and refresh-token stores.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use identity_service::config::TokenSettings;
use identity_service::db::UserRepository;
use identity_service::error::{IdentityError, Result};
use identity_service::models::User;
use identity_service::security::{RefreshTokenRecord, RefreshTokenStore};
use identity_service::{RequestContext, TokenIssuer};
use jwt_security::JwtKeys;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const TEST_SECRET: &str = "Zq8#Lm2!Rv7pWx4$Tn9@Kd3^Hs6&Jf1*Bg5(";

#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUsers {
    pub fn count_with_email(&self, email: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.email == email)
            .count()
    }

    pub fn set_superuser(&self, id: Uuid, flag: bool) {
        if let Some(user) = self.rows.lock().unwrap().get_mut(&id) {
            user.is_superuser = flag;
        }
    }

    pub fn remove(&self, id: Uuid) {
        self.rows.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User> {
        let mut rows = self.rows.lock().unwrap();
        // Mirrors the unique index on users.email
        if rows.values().any(|u| u.email == email) {
            return Err(IdentityError::AlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_superuser: false,
            created_at: now,
            updated_at: now,
        };
        rows.insert(user.id, user.clone());
        Ok(user)
    }
}

/// Refresh-token store that never evicts on its own, so stored expiry can be
/// exercised independently of TTL.
#[derive(Default)]
pub struct InMemoryRefreshTokens {
    entries: Mutex<HashMap<String, RefreshTokenRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryRefreshTokens {
    pub fn insert_raw(&self, token: &str, record: RefreshTokenRecord) {
        self.entries
            .lock()
            .unwrap()
            .insert(token.to_string(), record);
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.lock().unwrap().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(IdentityError::Unavailable("token store down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokens {
    async fn put(&self, token: &str, record: &RefreshTokenRecord, _ttl: Duration) -> Result<()> {
        self.check()?;
        self.insert_raw(token, record.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<RefreshTokenRecord>> {
        self.check()?;
        Ok(self.entries.lock().unwrap().get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(token);
        Ok(())
    }
}

pub struct Harness {
    pub issuer: TokenIssuer,
    pub users: Arc<InMemoryUsers>,
    pub tokens: Arc<InMemoryRefreshTokens>,
    pub keys: JwtKeys,
}

pub fn harness() -> Harness {
    harness_with(TokenSettings::default())
}

pub fn harness_with(settings: TokenSettings) -> Harness {
    let users = Arc::new(InMemoryUsers::default());
    let tokens = Arc::new(InMemoryRefreshTokens::default());
    let keys = JwtKeys::from_secret(TEST_SECRET).unwrap();

    let issuer = TokenIssuer::new(
        users.clone(),
        tokens.clone(),
        keys.clone(),
        settings,
    );

    Harness {
        issuer,
        users,
        tokens,
        keys,
    }
}

pub fn ctx() -> RequestContext {
    RequestContext::new("test-correlation")
}
