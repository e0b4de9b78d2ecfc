//! Repository trait definitions for testability and dependency injection.
//!
//! The session core depends only on [`UserRepository`] (the credential
//! store) and [`RefreshTokenRepository`] (the token ledger). PostgreSQL
//! implementations live here; in-memory ones live in [`super::memory`].

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::timeouts::with_timeout;
use crate::auth::{AuthError, AuthResult, RefreshTokenRecord, User, UserId};

/// Message used when the store rejects a duplicate email.
pub const EMAIL_TAKEN_MESSAGE: &str = "Email is already registered";

/// Trait for credential store operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// Fails with `AuthError::Conflict` if the email is already taken.
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>>;

    /// Find user by normalized (lowercase) email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Overwrite the mutable fields of an existing user.
    ///
    /// Fails with `AuthError::NotFound` if no such user exists.
    async fn update(&self, user: &User) -> AuthResult<()>;
}

/// Trait for token ledger operations
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Persist a newly issued refresh token
    async fn save(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Find a refresh token record by its value
    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Delete a refresh token record by its value.
    ///
    /// Returns `true` only for the caller that actually removed the record,
    /// so concurrent deletes of the same value have exactly one winner.
    async fn delete_by_token(&self, token: &str) -> AuthResult<bool>;

    /// Delete every refresh token belonging to a user, returning the count
    async fn delete_all_for_user(&self, user_id: UserId) -> AuthResult<u64>;
}

/// PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        bio: row.try_get("bio")?,
        avatar_id: row.try_get("avatar_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query(
                r#"
                INSERT INTO users (id, name, email, password_hash, bio, avatar_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.bio)
            .bind(user.avatar_id)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool),
        )
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(super::timeouts::TimeoutError::Database(e)) if is_unique_violation(&e) => {
                Err(AuthError::conflict(EMAIL_TAKEN_MESSAGE))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT id, name, email, password_hash, bio, avatar_id, created_at, updated_at
                 FROM users WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT id, name, email, password_hash, bio, avatar_id, created_at, updated_at
                 FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query(
                r#"
                UPDATE users
                SET name = $2, email = $3, password_hash = $4, bio = $5, avatar_id = $6, updated_at = $7
                WHERE id = $1
                "#,
            )
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.bio)
            .bind(user.avatar_id)
            .bind(user.updated_at)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::not_found("User"));
        }
        Ok(())
    }
}

/// PostgreSQL implementation of `RefreshTokenRepository`
pub struct PgRefreshTokenRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn save(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        with_timeout(
            self.query_timeout,
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens (id, user_id, token, expires_at, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(record.id)
            .bind(record.user_id)
            .bind(&record.token)
            .bind(record.expires_at)
            .bind(record.created_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        let row = with_timeout(
            self.query_timeout,
            sqlx::query(
                "SELECT id, user_id, token, expires_at, created_at
                 FROM refresh_tokens WHERE token = $1",
            )
            .bind(token)
            .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(RefreshTokenRecord {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token: row.try_get("token")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn delete_by_token(&self, token: &str) -> AuthResult<bool> {
        // A single DELETE is atomic: of two concurrent callers only one sees a row.
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
                .bind(token)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: UserId) -> AuthResult<u64> {
        let result = with_timeout(
            self.query_timeout,
            sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
                .bind(user_id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected())
    }
}
