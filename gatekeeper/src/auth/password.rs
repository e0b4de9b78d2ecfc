//! Argon2id password hashing with a server-side pepper.
//!
//! Hashes are stored in PHC string format so the algorithm parameters and
//! salt travel with the hash. Hashing and verification are CPU-bound and
//! run on the blocking thread pool.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::errors::{AuthError, AuthResult};
use crate::config::HashingConfig;

/// Password hasher bound to one pepper and one set of cost parameters.
#[derive(Clone)]
pub struct CredentialHasher {
    inner: Arc<Inner>,
}

struct Inner {
    pepper: Vec<u8>,
    params: Params,
    /// Hash of a random password, verified against when an account does not
    /// exist so both login failure paths cost the same.
    dummy_hash: String,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", &self.inner.params)
            .finish_non_exhaustive()
    }
}

impl CredentialHasher {
    /// Build a hasher.
    ///
    /// # Errors
    ///
    /// * `AuthError::Internal` - cost parameters rejected by argon2
    pub fn new(config: &HashingConfig, pepper: &str) -> AuthResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::internal(anyhow::anyhow!("invalid argon2 parameters: {e}")))?;

        let mut inner = Inner {
            pepper: pepper.as_bytes().to_vec(),
            params,
            dummy_hash: String::new(),
        };
        inner.dummy_hash = inner.hash(&uuid::Uuid::new_v4().to_string())?;

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Hash a plaintext password with a fresh random salt.
    pub async fn hash(&self, password: &str) -> AuthResult<String> {
        let inner = Arc::clone(&self.inner);
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || inner.hash(&password)).await?
    }

    /// Verify a plaintext password against a stored PHC hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only when the stored hash
    /// cannot be parsed or argon2 fails.
    pub async fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let inner = Arc::clone(&self.inner);
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || inner.verify(&password, &hash)).await?
    }

    /// Burn one verification's worth of time. The result is discarded.
    pub async fn verify_dummy(&self, password: &str) {
        let inner = Arc::clone(&self.inner);
        let password = password.to_owned();
        let _ = tokio::task::spawn_blocking(move || {
            let _ = inner.verify(&password, &inner.dummy_hash);
        })
        .await;
    }
}

impl Inner {
    fn argon2(&self) -> AuthResult<Argon2<'_>> {
        if self.pepper.is_empty() {
            return Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            ));
        }
        Argon2::new_with_secret(
            &self.pepper,
            Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
        .map_err(|e| AuthError::internal(anyhow::anyhow!("invalid password pepper: {e}")))
    }

    fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::internal(anyhow::anyhow!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::internal(anyhow::anyhow!("stored hash is unreadable: {e}")))?;

        match self.argon2()?.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::internal(anyhow::anyhow!(
                "password verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher(pepper: &str) -> CredentialHasher {
        CredentialHasher::new(&HashingConfig::minimal(), pepper).unwrap()
    }

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = hasher("pepper");
        let hash = hasher.hash("correct-horse-battery-staple").await.unwrap();

        assert!(hash.starts_with("$argon2id$"), "expected argon2id PHC prefix");
        assert!(!hash.contains("correct-horse"));
        assert!(hasher.verify("correct-horse-battery-staple", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_password_fails() {
        let hasher = hasher("pepper");
        let hash = hasher.hash("real-password").await.unwrap();
        assert!(!hasher.verify("wrong-password", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_pepper_is_part_of_the_hash() {
        let hash = hasher("pepper-one").hash("password123").await.unwrap();
        assert!(!hasher("pepper-two").verify("password123", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_salts_differ() {
        let hasher = hasher("");
        let a = hasher.hash("password123").await.unwrap();
        let b = hasher.hash("password123").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_unreadable_hash_is_internal() {
        let err = hasher("").verify("password123", "plaintext").await.unwrap_err();
        assert_eq!(err.kind(), crate::auth::errors::ErrorKind::Internal);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let config = HashingConfig {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        assert!(CredentialHasher::new(&config, "").is_err());
    }
}
