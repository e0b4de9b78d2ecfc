//! Session manager implementation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{
    codec::TokenCodec,
    errors::{AuthError, AuthResult},
    gate::AuthGate,
    models::{
        LoginRequest, PublicProfile, RefreshTokenRecord, RegisterRequest, TOKEN_TYPE_BEARER,
        TokenPair, UpdateProfileRequest, User, UserId,
    },
    password::CredentialHasher,
    validation,
};
use crate::config::AuthConfig;
use crate::db::repository::{EMAIL_TAKEN_MESSAGE, RefreshTokenRepository, UserRepository};

/// Shared by "no such account" and "wrong password".
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
/// Shared by "never existed" and "already consumed".
pub const REFRESH_NOT_FOUND_MESSAGE: &str = "Refresh token not found or already used";
pub const REFRESH_EXPIRED_MESSAGE: &str = "Refresh token has expired, please login again";

/// Session manager
///
/// Orchestrates registration, login, refresh rotation and logout over the
/// credential store and token ledger. Holds no mutable state of its own:
/// every session lives in the ledger.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn RefreshTokenRepository>,
    codec: TokenCodec,
    hasher: CredentialHasher,
    refresh_token_ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `tokens` - Refresh token ledger
    /// * `config` - Secrets, lifetimes and hashing cost
    ///
    /// # Errors
    ///
    /// * `AuthError::Internal` - signer or hasher misconfiguration
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn RefreshTokenRepository>,
        config: &AuthConfig,
    ) -> AuthResult<Self> {
        Ok(Self {
            users,
            tokens,
            codec: TokenCodec::new(&config.jwt_secret, config.access_token_ttl)?,
            hasher: CredentialHasher::new(&config.hashing, &config.password_pepper)?,
            refresh_token_ttl: config.refresh_token_ttl,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Authentication gate sharing this manager's token codec
    pub fn gate(&self) -> AuthGate {
        AuthGate::new(self.codec.clone())
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// * `AuthError::Validation` - malformed name, email or password
    /// * `AuthError::Conflict` - email already registered
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<PublicProfile> {
        validation::validate_registration(&request)?;

        let email = validation::normalize_email(&request.email);

        // Registration reveals whether an email exists; login does not.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::conflict(EMAIL_TAKEN_MESSAGE));
        }

        let password_hash = self.hasher.hash(&request.password).await?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            password_hash,
            bio: None,
            avatar_id: None,
            created_at: now,
            updated_at: now,
        };

        self.users.create(&user).await?;
        log::info!("Registered user {}", user.id);

        Ok(user.to_public())
    }

    /// Login a user
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - unknown email or wrong password; the
    ///   two cases are indistinguishable by message, status or timing
    pub async fn login(&self, request: LoginRequest) -> AuthResult<TokenPair> {
        validation::validate_login(&request.email, &request.password)?;

        let email = validation::normalize_email(&request.email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.hasher.verify_dummy(&request.password).await;
            return Err(AuthError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        };

        if !self
            .hasher
            .verify(&request.password, &user.password_hash)
            .await?
        {
            return Err(AuthError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
        }

        let tokens = self.issue_token_pair(&user).await?;
        log::info!("User {} logged in", user.id);

        Ok(tokens)
    }

    /// Exchange a refresh token for a new token pair (rotation)
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - token unknown, already used, or expired
    /// * `AuthError::NotFound` - the owning user no longer exists
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let record = self
            .tokens
            .find_by_token(refresh_token)
            .await?
            .ok_or_else(|| AuthError::unauthorized(REFRESH_NOT_FOUND_MESSAGE))?;

        if record.is_expired_at(Utc::now()) {
            if let Err(e) = self.tokens.delete_by_token(refresh_token).await {
                log::warn!("Failed to delete expired refresh token {}: {}", record.id, e);
            }
            return Err(AuthError::unauthorized(REFRESH_EXPIRED_MESSAGE));
        }

        let user = self
            .users
            .find_by_id(record.user_id)
            .await?
            .ok_or_else(|| AuthError::not_found("User"))?;

        // Consume before minting. Losing this race means someone else already
        // rotated the same value.
        if !self.tokens.delete_by_token(refresh_token).await? {
            return Err(AuthError::unauthorized(REFRESH_NOT_FOUND_MESSAGE));
        }

        self.issue_token_pair(&user).await
    }

    /// Logout by invalidating a refresh token. Unknown tokens are not an error.
    ///
    /// Returns whether a live token was actually removed.
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<bool> {
        self.tokens.delete_by_token(refresh_token).await
    }

    /// Invalidate every refresh token of a user, returning how many were removed
    pub async fn revoke_all_sessions(&self, user_id: UserId) -> AuthResult<u64> {
        let revoked = self.tokens.delete_all_for_user(user_id).await?;
        log::info!("Revoked {} session(s) for user {}", revoked, user_id);
        Ok(revoked)
    }

    /// Public profile of a user
    pub async fn profile(&self, user_id: UserId) -> AuthResult<PublicProfile> {
        Ok(self.load_user(user_id).await?.to_public())
    }

    /// Update name and/or bio
    pub async fn update_profile(
        &self,
        user_id: UserId,
        request: UpdateProfileRequest,
    ) -> AuthResult<PublicProfile> {
        validation::validate_profile_update(&request)?;

        let mut user = self.load_user(user_id).await?;
        if let Some(name) = request.name {
            user.name = name.trim().to_string();
        }
        user.bio = request.bio;
        user.updated_at = Utc::now();

        self.users.update(&user).await?;
        Ok(user.to_public())
    }

    /// Point the user's avatar at an already-stored image
    pub async fn assign_avatar(&self, user_id: UserId, avatar_id: Uuid) -> AuthResult<PublicProfile> {
        let mut user = self.load_user(user_id).await?;
        user.avatar_id = Some(avatar_id);
        user.updated_at = Utc::now();

        self.users.update(&user).await?;
        Ok(user.to_public())
    }

    async fn load_user(&self, user_id: UserId) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::not_found("User"))
    }

    /// Mint both tokens and persist the refresh record. Nothing is returned
    /// unless the record was stored.
    async fn issue_token_pair(&self, user: &User) -> AuthResult<TokenPair> {
        let access_token = self.codec.issue_access_token(user.id, &user.email)?;
        let refresh_token = self.codec.issue_refresh_identifier();

        let now = Utc::now();
        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: refresh_token.clone(),
            expires_at: now + self.refresh_token_ttl,
            created_at: now,
        };
        self.tokens.save(&record).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.codec.access_token_ttl().num_seconds(),
        })
    }
}
