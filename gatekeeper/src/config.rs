//! Session core configuration.
//!
//! Token lifetimes, the signing secret, the password pepper and the
//! Argon2 cost parameters. Values come from the environment; the loading
//! mechanism beyond that is the caller's business.

use chrono::Duration;
use std::env;

/// Default access token lifetime in minutes.
pub const DEFAULT_ACCESS_EXPIRES_MINUTES: i64 = 15;
/// Default refresh token lifetime in days.
pub const DEFAULT_REFRESH_EXPIRES_DAYS: i64 = 7;

/// Longest accepted access token lifetime (one day).
pub const MAX_ACCESS_EXPIRES_MINUTES: i64 = 24 * 60;
/// Longest accepted refresh token lifetime (one year).
pub const MAX_REFRESH_EXPIRES_DAYS: i64 = 365;

/// Minimum signing secret length (128-bit security when hex encoded).
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Argon2id cost parameters.
///
/// The defaults are the OWASP-recommended minimum (19 MiB, 2 passes, 1 lane),
/// which lands in the tens of milliseconds per hash on server hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl HashingConfig {
    /// Cheapest parameters argon2 accepts. For tests only.
    pub fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret used to sign and verify access tokens
    pub jwt_secret: String,
    /// Server-side pepper mixed into password hashes (may be empty)
    pub password_pepper: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub hashing: HashingConfig,
}

impl AuthConfig {
    /// Create a configuration with default lifetimes and hashing cost.
    pub fn new(jwt_secret: impl Into<String>, password_pepper: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            password_pepper: password_pepper.into(),
            access_token_ttl: Duration::minutes(DEFAULT_ACCESS_EXPIRES_MINUTES),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_EXPIRES_DAYS),
            hashing: HashingConfig::default(),
        }
    }

    /// Create configuration from environment variables
    ///
    /// | Env Var                      | Required | Default |
    /// |------------------------------|----------|---------|
    /// | `JWT_SECRET`                 | **yes**  | --      |
    /// | `PASSWORD_PEPPER`            | no       | empty   |
    /// | `JWT_ACCESS_EXPIRES_MINUTES` | no       | `15`    |
    /// | `JWT_REFRESH_EXPIRES_DAYS`   | no       | `7`     |
    /// | `ARGON2_MEMORY_KIB`          | no       | `19456` |
    /// | `ARGON2_ITERATIONS`          | no       | `2`     |
    /// | `ARGON2_PARALLELISM`         | no       | `1`     |
    ///
    /// # Errors
    ///
    /// Returns error if a required variable is missing or a value fails
    /// [`AuthConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let defaults = HashingConfig::default();
        let config = Self {
            jwt_secret,
            password_pepper: env::var("PASSWORD_PEPPER").unwrap_or_default(),
            access_token_ttl: lifetime_from_env(
                "JWT_ACCESS_EXPIRES_MINUTES",
                DEFAULT_ACCESS_EXPIRES_MINUTES,
                Duration::try_minutes,
            )?,
            refresh_token_ttl: lifetime_from_env(
                "JWT_REFRESH_EXPIRES_DAYS",
                DEFAULT_REFRESH_EXPIRES_DAYS,
                Duration::try_days,
            )?,
            hashing: HashingConfig {
                memory_kib: parse_env_or("ARGON2_MEMORY_KIB", defaults.memory_kib)?,
                iterations: parse_env_or("ARGON2_ITERATIONS", defaults.iterations)?,
                parallelism: parse_env_or("ARGON2_PARALLELISM", defaults.parallelism)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }

        if self.access_token_ttl <= Duration::zero() {
            return Err(ConfigError::Invalid {
                var: "JWT_ACCESS_EXPIRES_MINUTES".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.access_token_ttl > Duration::minutes(MAX_ACCESS_EXPIRES_MINUTES) {
            return Err(ConfigError::Invalid {
                var: "JWT_ACCESS_EXPIRES_MINUTES".to_string(),
                reason: format!("Must be at most {MAX_ACCESS_EXPIRES_MINUTES}"),
            });
        }

        if self.refresh_token_ttl > Duration::days(MAX_REFRESH_EXPIRES_DAYS) {
            return Err(ConfigError::Invalid {
                var: "JWT_REFRESH_EXPIRES_DAYS".to_string(),
                reason: format!("Must be at most {MAX_REFRESH_EXPIRES_DAYS}"),
            });
        }

        if self.refresh_token_ttl <= self.access_token_ttl {
            return Err(ConfigError::Invalid {
                var: "JWT_REFRESH_EXPIRES_DAYS".to_string(),
                reason: "Refresh tokens must outlive access tokens".to_string(),
            });
        }

        if self.hashing.iterations == 0 || self.hashing.parallelism == 0 {
            return Err(ConfigError::Invalid {
                var: "ARGON2_ITERATIONS".to_string(),
                reason: "Iterations and parallelism must be greater than 0".to_string(),
            });
        }

        if self.hashing.memory_kib < 8 * self.hashing.parallelism {
            return Err(ConfigError::Invalid {
                var: "ARGON2_MEMORY_KIB".to_string(),
                reason: "Must be at least 8 KiB per lane".to_string(),
            });
        }

        Ok(())
    }
}

/// Parse an optional environment variable, falling back to `default` when
/// unset. A value that is set but unparsable is an error.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Could not parse {raw:?}"),
        }),
        Err(_) => Ok(default),
    }
}

/// Read a lifetime in whole units. Values chrono cannot represent are
/// rejected instead of panicking.
fn lifetime_from_env(
    key: &str,
    default: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError> {
    let units = parse_env_or(key, default)?;
    to_duration(units).ok_or_else(|| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("{units} is out of range"),
    })
}
