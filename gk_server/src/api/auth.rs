//! Authentication API handlers.
//!
//! Register, login, refresh rotation, logout and logout-all. Every response
//! uses the `{"success", "data" | "error"}` envelope.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Ann", "email": "ann@example.com", "password": "password123"}'
//! ```
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"email": "ann@example.com", "password": "password123"}'
//! ```

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatekeeper::auth::{AuthContext, AuthError, FieldError, LoginRequest, RegisterRequest};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    error::{ApiError, ApiJson},
    request_id::RequestId,
    response,
};
use crate::{
    logging::{SecurityEvent, log_security_event},
    metrics,
};

/// Body of `/auth/refresh` and `/auth/logout`.
#[derive(Debug, Deserialize)]
pub struct RefreshTokenPayload {
    #[serde(default)]
    pub refresh_token: String,
}

impl RefreshTokenPayload {
    fn require(self) -> Result<String, ApiError> {
        if self.refresh_token.trim().is_empty() {
            return Err(AuthError::Validation(vec![FieldError::new(
                "refresh_token",
                "This field is required",
            )])
            .into());
        }
        Ok(self.refresh_token)
    }
}

#[derive(Debug, Serialize)]
pub struct RevokedSessions {
    pub revoked: u64,
}

/// Register a new user account.
///
/// # Request Body
///
/// ```json
/// { "name": "Ann", "email": "ann@example.com", "password": "password123" }
/// ```
///
/// # Response
///
/// `201 Created` with the public profile.
///
/// # Errors
///
/// - `400 VALIDATION_ERROR`: name, email or password malformed
/// - `409 CONFLICT`: email already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    let profile = state.sessions.register(payload).await?;
    metrics::registrations_total();
    Ok(response::success(StatusCode::CREATED, profile))
}

/// Login with email and password.
///
/// # Response
///
/// `200 OK` with a token pair:
/// ```json
/// {
///   "access_token": "eyJhbGciOiJIUzI1NiIs...",
///   "refresh_token": "6f0c6a52-...",
///   "token_type": "Bearer",
///   "expires_in": 900
/// }
/// ```
///
/// # Errors
///
/// - `401 UNAUTHORIZED`: unknown email or wrong password (same message for both)
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    match state.sessions.login(payload).await {
        Ok(tokens) => {
            metrics::login_attempts_total(true);
            Ok(response::ok(tokens))
        }
        Err(err) => {
            if matches!(err, AuthError::Unauthorized(_)) {
                metrics::login_attempts_total(false);
                log_security_event(
                    SecurityEvent::FailedLogin,
                    None,
                    Some(request_id.as_str()),
                    &err.client_message(),
                );
            }
            Err(err.into())
        }
    }
}

/// Exchange a refresh token for a new pair. The presented token is consumed.
///
/// # Errors
///
/// - `401 UNAUTHORIZED`: token unknown, already used, or expired
/// - `404 NOT_FOUND`: the token's owner no longer exists
pub async fn refresh(
    State(state): State<AppState>,
    request_id: RequestId,
    ApiJson(payload): ApiJson<RefreshTokenPayload>,
) -> Result<Response, ApiError> {
    let refresh_token = payload.require()?;

    match state.sessions.refresh(&refresh_token).await {
        Ok(tokens) => {
            metrics::token_refresh_total(true);
            Ok(response::ok(tokens))
        }
        Err(err) => {
            metrics::token_refresh_total(false);
            if matches!(err, AuthError::Unauthorized(_)) {
                log_security_event(
                    SecurityEvent::RejectedRefresh,
                    None,
                    Some(request_id.as_str()),
                    &err.client_message(),
                );
            }
            Err(err.into())
        }
    }
}

/// Invalidate one refresh token. Idempotent: unknown tokens still yield 204.
pub async fn logout(
    State(state): State<AppState>,
    Extension(_ctx): Extension<AuthContext>,
    ApiJson(payload): ApiJson<RefreshTokenPayload>,
) -> Result<Response, ApiError> {
    let refresh_token = payload.require()?;
    if state.sessions.logout(&refresh_token).await? {
        metrics::sessions_revoked_total(1);
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Invalidate every refresh token of the authenticated user.
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    request_id: RequestId,
) -> Result<Response, ApiError> {
    let revoked = state.sessions.revoke_all_sessions(ctx.user_id).await?;
    metrics::sessions_revoked_total(revoked);
    log_security_event(
        SecurityEvent::SessionsRevoked,
        Some(ctx.user_id),
        Some(request_id.as_str()),
        &format!("{revoked} session(s) revoked"),
    );
    Ok(response::ok(RevokedSessions { revoked }))
}
