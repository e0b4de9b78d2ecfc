//! Integration tests for the session lifecycle.
//!
//! Runs the full register, login, refresh, logout flow against the in-memory
//! stores. The PostgreSQL variant at the bottom needs a live database.

use std::sync::Arc;

use gatekeeper::auth::{
    AuthError, ErrorKind, LoginRequest, RegisterRequest, SessionManager, UpdateProfileRequest,
};
use gatekeeper::config::{AuthConfig, HashingConfig};
use gatekeeper::db::{
    Database, DatabaseConfig, InMemoryRefreshTokenRepository, InMemoryUserRepository,
    RefreshTokenRepository, UserRepository,
};
use uuid::Uuid;

const SECRET: &str = "integration-secret-long-enough-for-hs256";

fn test_config() -> AuthConfig {
    let mut config = AuthConfig::new(SECRET, "integration-pepper");
    config.hashing = HashingConfig::minimal();
    config
}

/// Helper to create a session manager over fresh in-memory stores
fn setup_manager() -> (SessionManager, InMemoryRefreshTokenRepository) {
    let tokens = InMemoryRefreshTokenRepository::new();
    let manager = SessionManager::new(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(tokens.clone()),
        &test_config(),
    )
    .expect("Failed to build session manager");
    (manager, tokens)
}

fn register(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Ann".to_string(),
        email: email.to_string(),
        password: "password123".to_string(),
    }
}

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let (manager, tokens) = setup_manager();

    let profile = manager
        .register(register("Ann@X.com"))
        .await
        .expect("Registration should succeed");
    assert_eq!(profile.email, "ann@x.com");

    let first = manager
        .login(login("ann@x.com", "password123"))
        .await
        .expect("Login should succeed");
    assert_eq!(first.token_type, "Bearer");
    assert_eq!(first.expires_in, 900);

    let ctx = manager
        .gate()
        .authenticate(Some(&format!("Bearer {}", first.access_token)))
        .expect("Fresh access token should authenticate");
    assert_eq!(ctx.user_id, profile.id);
    assert_eq!(ctx.email, "ann@x.com");

    let second = manager
        .refresh(&first.refresh_token)
        .await
        .expect("Refresh should succeed");
    assert_ne!(second.refresh_token, first.refresh_token);

    // The consumed value is dead, the new one is live.
    let reuse = manager.refresh(&first.refresh_token).await.unwrap_err();
    assert_eq!(reuse.kind(), ErrorKind::Unauthorized);
    assert_eq!(tokens.count_for_user(profile.id), 1);

    manager
        .logout(&second.refresh_token)
        .await
        .expect("Logout should succeed");
    let after_logout = manager.refresh(&second.refresh_token).await.unwrap_err();
    assert_eq!(after_logout.kind(), ErrorKind::Unauthorized);
    assert!(tokens.is_empty());
}

#[tokio::test]
async fn test_login_does_not_reveal_which_part_was_wrong() {
    let (manager, _) = setup_manager();
    manager.register(register("ann@x.com")).await.unwrap();

    let bad_password = manager
        .login(login("ann@x.com", "wrong-password"))
        .await
        .unwrap_err();
    let no_account = manager
        .login(login("ghost@x.com", "password123"))
        .await
        .unwrap_err();

    assert_eq!(bad_password.kind(), no_account.kind());
    assert_eq!(bad_password.status_code(), 401);
    assert_eq!(bad_password.client_message(), no_account.client_message());
    assert_eq!(bad_password.code(), no_account.code());
}

#[tokio::test]
async fn test_duplicate_registration_differs_only_in_case() {
    let (manager, _) = setup_manager();
    manager.register(register("ann@x.com")).await.unwrap();

    let err = manager.register(register("ANN@X.COM")).await.unwrap_err();
    assert!(matches!(err, AuthError::Conflict(_)));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_concurrent_refresh_has_single_winner() {
    let (manager, tokens) = setup_manager();
    let profile = manager.register(register("ann@x.com")).await.unwrap();
    let pair = manager
        .login(login("ann@x.com", "password123"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        let token = pair.refresh_token.clone();
        handles.push(tokio::spawn(async move { manager.refresh(&token).await }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::Unauthorized),
        }
    }

    assert_eq!(winners, 1, "exactly one rotation may succeed");
    assert_eq!(tokens.count_for_user(profile.id), 1);
}

#[tokio::test]
async fn test_logout_unknown_token_is_ok() {
    let (manager, _) = setup_manager();
    let removed = manager
        .logout("never-issued")
        .await
        .expect("Unknown tokens are ignored");
    assert!(!removed);
}

#[tokio::test]
async fn test_sessions_are_independent_per_login() {
    let (manager, _) = setup_manager();
    manager.register(register("ann@x.com")).await.unwrap();

    let laptop = manager.login(login("ann@x.com", "password123")).await.unwrap();
    let phone = manager.login(login("ann@x.com", "password123")).await.unwrap();

    manager.logout(&laptop.refresh_token).await.unwrap();
    manager
        .refresh(&phone.refresh_token)
        .await
        .expect("Other session should survive a single logout");
}

#[tokio::test]
async fn test_profile_update_rejects_invalid_fields() {
    let (manager, _) = setup_manager();
    let profile = manager.register(register("ann@x.com")).await.unwrap();

    let err = manager
        .update_profile(
            profile.id,
            UpdateProfileRequest {
                name: Some("A".to_string()),
                bio: Some("x".repeat(501)),
            },
        )
        .await
        .unwrap_err();

    let fields: Vec<_> = err
        .details()
        .expect("validation errors carry details")
        .iter()
        .map(|f| f.field.as_str())
        .collect();
    assert_eq!(fields, ["name", "bio"]);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_session_lifecycle_postgres() {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/gatekeeper_test".to_string());
    let config = DatabaseConfig {
        database_url,
        max_connections: 5,
        min_connections: 1,
        connection_timeout_secs: 5,
        ..DatabaseConfig::development()
    };

    let db = Database::new(&config)
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Migration failed");

    let users: Arc<dyn UserRepository> = Arc::new(db.user_repository());
    let tokens: Arc<dyn RefreshTokenRepository> = Arc::new(db.refresh_token_repository());
    let manager = SessionManager::new(users, tokens.clone(), &test_config()).unwrap();

    let email = format!("pg-{}@example.com", Uuid::new_v4());
    let profile = manager.register(register(&email)).await.unwrap();
    let pair = manager.login(login(&email, "password123")).await.unwrap();

    let rotated = manager.refresh(&pair.refresh_token).await.unwrap();
    assert!(manager.refresh(&pair.refresh_token).await.is_err());
    assert!(!tokens.delete_by_token(&pair.refresh_token).await.unwrap());

    assert_eq!(manager.revoke_all_sessions(profile.id).await.unwrap(), 1);
    assert!(manager.refresh(&rotated.refresh_token).await.is_err());

    db.close().await;
}
