//! In-memory store implementations.
//!
//! Used by tests and by the server when it runs without a database. Each
//! store guards its map with one mutex, so every trait method is a single
//! atomic step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::repository::{EMAIL_TAKEN_MESSAGE, RefreshTokenRepository, UserRepository};
use crate::auth::{AuthError, AuthResult, RefreshTokenRecord, User, UserId};

fn lock<T>(mutex: &Mutex<T>) -> AuthResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AuthError::internal(anyhow::anyhow!("in-memory store lock poisoned")))
}

/// In-memory credential store
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::conflict(EMAIL_TAKEN_MESSAGE));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = lock(&self.users)?;
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(AuthError::conflict(EMAIL_TAKEN_MESSAGE));
        }
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AuthError::not_found("User")),
        }
    }
}

/// In-memory token ledger keyed by token value
#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Arc<Mutex<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records for a user
    pub fn count_for_user(&self, user_id: UserId) -> usize {
        self.tokens
            .lock()
            .map(|tokens| tokens.values().filter(|r| r.user_id == user_id).count())
            .unwrap_or(0)
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.tokens.lock().map(|tokens| tokens.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn save(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        let mut tokens = lock(&self.tokens)?;
        if tokens.contains_key(&record.token) {
            return Err(AuthError::internal(anyhow::anyhow!(
                "refresh token value collision"
            )));
        }
        tokens.insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        Ok(lock(&self.tokens)?.get(token).cloned())
    }

    async fn delete_by_token(&self, token: &str) -> AuthResult<bool> {
        Ok(lock(&self.tokens)?.remove(token).is_some())
    }

    async fn delete_all_for_user(&self, user_id: UserId) -> AuthResult<u64> {
        let mut tokens = lock(&self.tokens)?;
        let before = tokens.len();
        tokens.retain(|_, record| record.user_id != user_id);
        Ok((before - tokens.len()) as u64)
    }
}
