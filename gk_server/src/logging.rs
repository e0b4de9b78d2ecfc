//! Structured logging setup and security event helpers.
//!
//! The library crate logs through the `log` facade; the subscriber installed
//! here bridges those records into `tracing`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use gk_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Kinds of security-relevant events worth a warning-level record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    FailedLogin,
    RejectedToken,
    RejectedRefresh,
    SessionsRevoked,
}

impl SecurityEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            SecurityEvent::FailedLogin => "failed_login",
            SecurityEvent::RejectedToken => "rejected_token",
            SecurityEvent::RejectedRefresh => "rejected_refresh",
            SecurityEvent::SessionsRevoked => "sessions_revoked",
        }
    }
}

/// Log security event with structured data
///
/// Never pass credentials or token values in `message`.
///
/// # Arguments
///
/// * `event` - Type of security event
/// * `user_id` - Optional user ID
/// * `request_id` - Optional correlation ID of the triggering request
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use gk_server::logging::{SecurityEvent, log_security_event};
///
/// log_security_event(
///     SecurityEvent::FailedLogin,
///     None,
///     Some("4b1c9e0a-0000-4000-8000-000000000000"),
///     "Invalid email or password",
/// );
/// ```
pub fn log_security_event(
    event: SecurityEvent,
    user_id: Option<Uuid>,
    request_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event.as_str(),
        user_id = user_id.map(|id| id.to_string()),
        request_id = request_id,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_event_names() {
        assert_eq!(SecurityEvent::FailedLogin.as_str(), "failed_login");
        assert_eq!(SecurityEvent::SessionsRevoked.as_str(), "sessions_revoked");
    }

    #[test]
    fn test_log_security_event() {
        // Just ensure it doesn't panic without a subscriber
        log_security_event(
            SecurityEvent::RejectedToken,
            Some(Uuid::new_v4()),
            Some("req-1"),
            "Test message",
        );
        log_security_event(SecurityEvent::FailedLogin, None, None, "Test message");
    }
}
