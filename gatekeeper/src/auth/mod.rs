//! Authentication module providing registration, login and session lifecycle.
//!
//! This module implements:
//! - Argon2id password hashing with server-side pepper
//! - HS256 JWT access tokens (15-minute default expiry)
//! - Opaque, single-use rotating refresh tokens (7-day default expiry)
//! - A transport-agnostic gate that turns an `Authorization` header into an
//!   [`AuthContext`]
//!
//! ## Example
//!
//! ```no_run
//! use gatekeeper::auth::{LoginRequest, RegisterRequest, SessionManager};
//! use gatekeeper::config::AuthConfig;
//! use gatekeeper::db::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::from_env()?;
//!     let sessions = SessionManager::new(
//!         Arc::new(InMemoryUserRepository::new()),
//!         Arc::new(InMemoryRefreshTokenRepository::new()),
//!         &config,
//!     )?;
//!
//!     sessions
//!         .register(RegisterRequest {
//!             name: "Ann".to_string(),
//!             email: "ann@example.com".to_string(),
//!             password: "password123".to_string(),
//!         })
//!         .await?;
//!
//!     let tokens = sessions
//!         .login(LoginRequest {
//!             email: "ann@example.com".to_string(),
//!             password: "password123".to_string(),
//!         })
//!         .await?;
//!
//!     let ctx = sessions
//!         .gate()
//!         .authenticate(Some(&format!("Bearer {}", tokens.access_token)))?;
//!     println!("Authenticated {}", ctx.email);
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod errors;
pub mod gate;
pub mod manager;
pub mod models;
pub mod password;
pub mod validation;

pub use codec::TokenCodec;
pub use errors::{AuthError, AuthResult, ErrorKind, FieldError};
pub use gate::AuthGate;
pub use manager::SessionManager;
pub use models::{
    AccessTokenClaims, AuthContext, LoginRequest, PublicProfile, RefreshTokenRecord,
    RegisterRequest, TokenPair, UpdateProfileRequest, User, UserId,
};
pub use password::CredentialHasher;
