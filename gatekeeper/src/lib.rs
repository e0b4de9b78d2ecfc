//! # Gatekeeper
//!
//! Authentication and session lifecycle core for HTTP APIs.
//!
//! A user registers with a name, email and password, logs in to receive a
//! short-lived signed access token plus a long-lived opaque refresh token,
//! exchanges the refresh token for a fresh pair (rotation, single use), and
//! logs out by invalidating it. Protected requests pass through an
//! [`AuthGate`] that verifies the bearer access token.
//!
//! ## Core Modules
//!
//! - [`auth`]: Token codec, session manager, gate, and error taxonomy
//! - [`db`]: Credential store and token ledger contracts with PostgreSQL and
//!   in-memory implementations
//! - [`config`]: Secrets, token lifetimes and hashing cost

/// Authentication, sessions and the error taxonomy.
pub mod auth;
pub use auth::{
    AuthContext, AuthError, AuthGate, AuthResult, ErrorKind, SessionManager, TokenCodec, TokenPair,
};

/// Environment-driven configuration.
pub mod config;
pub use config::{AuthConfig, ConfigError};

/// Persistence contracts and implementations.
pub mod db;
