//! Authentication error types.
//!
//! Every failure leaving the session core is one of the [`AuthError`]
//! variants below, and every variant maps to exactly one [`ErrorKind`],
//! which in turn carries the HTTP status and machine-readable code the
//! boundary should use.

use serde::Serialize;
use thiserror::Error;

use crate::db::timeouts::TimeoutError;

/// Message returned to callers in place of any internal failure.
pub const INTERNAL_CLIENT_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Closed catalogue of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    BadRequest,
    Unauthorized,
    TokenExpired,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub const fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation | ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized | ErrorKind::TokenExpired => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Internal => 500,
        }
    }

    /// Machine-readable error code for this kind.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::TokenExpired => "TOKEN_EXPIRED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more input fields failed validation
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Structurally invalid request
    #[error("{0}")]
    BadRequest(String),

    /// Bad credentials or an invalid, malformed, reused or forged token
    #[error("{0}")]
    Unauthorized(String),

    /// Access token past its expiry
    #[error("Access token has expired")]
    TokenExpired,

    /// Authenticated but not entitled
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity absent
    #[error("{0}")]
    NotFound(String),

    /// Duplicate resource
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected. The cause is for server-side diagnostics only.
    #[error("Internal error: {0:#}")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AuthError::Unauthorized(message.into())
    }

    pub fn not_found(entity: &str) -> Self {
        AuthError::NotFound(format!("{entity} not found"))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AuthError::Conflict(message.into())
    }

    pub fn forbidden() -> Self {
        AuthError::Forbidden("You do not have permission to perform this action".to_string())
    }

    pub fn internal(cause: impl Into<anyhow::Error>) -> Self {
        AuthError::Internal(cause.into())
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::BadRequest(_) => ErrorKind::BadRequest,
            AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::TokenExpired => ErrorKind::TokenExpired,
            AuthError::Forbidden(_) => ErrorKind::Forbidden,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Conflict(_) => ErrorKind::Conflict,
            AuthError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Internal causes are replaced by a generic message; every other
    /// variant is already worded for callers.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Internal(_) => INTERNAL_CLIENT_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    /// Field-level details, present only for validation failures.
    pub fn details(&self) -> Option<&[FieldError]> {
        match self {
            AuthError::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Internal(anyhow::Error::new(err).context("database operation failed"))
    }
}

impl From<TimeoutError> for AuthError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Database(e) => e.into(),
            timeout @ TimeoutError::Timeout(_) => AuthError::Internal(timeout.into()),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(anyhow::Error::new(err).context("blocking task failed"))
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_maps_to_one_status_and_code() {
        let cases = [
            (AuthError::Validation(vec![]), 400, "VALIDATION_ERROR"),
            (AuthError::BadRequest("x".into()), 400, "BAD_REQUEST"),
            (AuthError::unauthorized("x"), 401, "UNAUTHORIZED"),
            (AuthError::TokenExpired, 401, "TOKEN_EXPIRED"),
            (AuthError::forbidden(), 403, "FORBIDDEN"),
            (AuthError::not_found("User"), 404, "NOT_FOUND"),
            (AuthError::conflict("x"), 409, "CONFLICT"),
            (AuthError::internal(anyhow::anyhow!("boom")), 500, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status, "status for {err:?}");
            assert_eq!(err.code(), code, "code for {err:?}");
        }
    }

    #[test]
    fn test_internal_cause_is_not_exposed() {
        let err = AuthError::internal(anyhow::anyhow!("relation \"users\" does not exist"));
        assert_eq!(err.client_message(), INTERNAL_CLIENT_MESSAGE);
        assert!(err.to_string().contains("relation"));
    }

    #[test]
    fn test_sqlx_error_becomes_internal() {
        let err: AuthError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.client_message(), INTERNAL_CLIENT_MESSAGE);
    }

    #[test]
    fn test_validation_details() {
        let err = AuthError::Validation(vec![FieldError::new("email", "Must be a valid email address")]);
        let details = err.details().expect("validation carries details");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "email");
        assert!(AuthError::TokenExpired.details().is_none());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AuthError::not_found("User").client_message(), "User not found");
    }
}
