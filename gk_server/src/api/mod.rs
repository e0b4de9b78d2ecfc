//! HTTP API for the authentication server.
//!
//! # Modules
//!
//! - [`auth`]: Register, login, refresh, logout, logout-all
//! - [`users`]: Own profile and public profiles of other users
//! - [`middleware`]: Bearer-token gate for protected endpoints
//! - [`request_id`]: `x-request-id` correlation
//! - [`error`]: Error envelope and JSON extractor
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                         - Health check (public)
//! POST /api/v1/auth/register           - Register user (public)
//! POST /api/v1/auth/login              - Login (public)
//! POST /api/v1/auth/refresh            - Rotate refresh token (public)
//! POST /api/v1/auth/logout             - Invalidate one refresh token (auth required)
//! POST /api/v1/auth/logout-all         - Invalidate all refresh tokens (auth required)
//! GET  /api/v1/users/me                - Own profile (auth required)
//! PUT  /api/v1/users/me                - Update name/bio (auth required)
//! PUT  /api/v1/users/me/avatar         - Set avatar (auth required)
//! GET  /api/v1/users/{id}               - Public profile by id (auth required)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use gk_server::api::{AppState, create_router};
//! use gatekeeper::config::AuthConfig;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::in_memory(&AuthConfig::from_env()?)?;
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. In production, put the server behind a
//! proxy that restricts origins.

pub mod auth;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod response;
pub mod users;

use std::{any::Any, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use gatekeeper::{
    AuthError, AuthGate, AuthResult, SessionManager,
    config::AuthConfig,
    db::{Database, InMemoryRefreshTokenRepository, InMemoryUserRepository},
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};

use error::ApiError;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub gate: AuthGate,
    /// `None` when running on the in-memory stores.
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(sessions: SessionManager, database: Option<Database>) -> Self {
        let gate = sessions.gate();
        Self {
            sessions: Arc::new(sessions),
            gate,
            database,
        }
    }

    /// State backed by PostgreSQL
    pub fn with_database(database: Database, config: &AuthConfig) -> AuthResult<Self> {
        let sessions = SessionManager::new(
            Arc::new(database.user_repository()),
            Arc::new(database.refresh_token_repository()),
            config,
        )?;
        Ok(Self::new(sessions, Some(database)))
    }

    /// State backed by process-local stores. Sessions do not survive a restart.
    pub fn in_memory(config: &AuthConfig) -> AuthResult<Self> {
        let sessions = SessionManager::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryRefreshTokenRepository::new()),
            config,
        )?;
        Ok(Self::new(sessions, None))
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    // Public routes (no authentication middleware)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    // Protected routes (require authentication middleware)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout-all", post(auth::logout_all))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/me/avatar", put(users::update_avatar))
        .route("/users/{id}", get(users::get_user))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Turn a handler panic into the generic `INTERNAL_ERROR` envelope.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    ApiError(AuthError::internal(anyhow::anyhow!(
        "handler panicked: {detail}"
    )))
    .into_response()
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when storage is reachable, `503 Service Unavailable`
/// otherwise.
///
/// # Example
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","storage":"postgres","database":true,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, db_healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage,
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
