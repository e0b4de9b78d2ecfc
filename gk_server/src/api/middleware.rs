//! Authentication middleware for protected endpoints.
//!
//! Hands the `Authorization` header to the [`AuthGate`](gatekeeper::AuthGate)
//! and, on success, injects the verified [`AuthContext`] into request
//! extensions for downstream handlers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! # use gk_server::api::middleware::auth_middleware;
//! # use gk_server::api::AppState;
//! # async fn handler() {}
//! # let state: AppState = unimplemented!();
//!
//! let protected_routes: Router = Router::new()
//!     .route("/api/protected", get(handler))
//!     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
//!     .with_state(state);
//! # let _ = protected_routes;
//! ```
//!
//! # Extracting the caller
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use gatekeeper::AuthContext;
//!
//! async fn protected_handler(Extension(ctx): Extension<AuthContext>) -> String {
//!     format!("Authenticated as {}", ctx.email)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::{AppState, error::ApiError, request_id::RequestId};
use crate::logging::{SecurityEvent, log_security_event};

/// Authentication middleware that validates the bearer access token.
///
/// # Behavior
///
/// - **Success**: injects `AuthContext` into request extensions and calls the next handler
/// - **Missing header / bad format / invalid token**: `401 UNAUTHORIZED`
/// - **Expired token**: `401 TOKEN_EXPIRED`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Non-ASCII values are present but unreadable: fail the format check.
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or("?"));

    match state.gate.authenticate(header) {
        Ok(ctx) => {
            request.extensions_mut().insert(ctx);
            Ok(next.run(request).await)
        }
        Err(err) => {
            let request_id = request.extensions().get::<RequestId>();
            log_security_event(
                SecurityEvent::RejectedToken,
                None,
                request_id.map(RequestId::as_str),
                &err.client_message(),
            );
            Err(err.into())
        }
    }
}
