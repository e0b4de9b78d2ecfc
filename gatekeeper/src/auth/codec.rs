//! Access-token signing/verification and refresh-identifier minting.
//!
//! Access tokens are HS256-signed JWTs carrying [`AccessTokenClaims`].
//! Refresh tokens are opaque random strings with no structure at all; they
//! are revoked simply by deleting their ledger record.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use uuid::Uuid;

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, UserId},
};

/// Message for any access token that fails verification for a reason
/// other than expiry. Signature, structure and claim failures are not
/// distinguished.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or malformed token";

const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Stateless token codec
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("access_token_ttl", &self.access_token_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Create a codec signing with `secret`.
    ///
    /// # Errors
    ///
    /// * `AuthError::Internal` - empty secret or non-positive lifetime
    pub fn new(secret: &str, access_token_ttl: Duration) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::internal(anyhow::anyhow!(
                "access token signing secret is empty"
            )));
        }
        if access_token_ttl <= Duration::zero() {
            return Err(AuthError::internal(anyhow::anyhow!(
                "access token lifetime must be positive"
            )));
        }

        // Pin the algorithm: the token header is never trusted to choose it.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_ttl,
        })
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    /// Sign a new access token for the given user.
    pub fn issue_access_token(&self, user_id: UserId, email: &str) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_token_ttl).timestamp(),
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(anyhow::Error::new(e).context("signing access token")))
    }

    /// Mint an opaque refresh token value (UUID v4 from the OS CSPRNG).
    pub fn issue_refresh_identifier(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Verify signature, algorithm and expiry of an access token.
    ///
    /// # Errors
    ///
    /// * `AuthError::TokenExpired` - token was valid but its lifetime elapsed
    /// * `AuthError::Unauthorized` - anything else
    pub fn validate_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::unauthorized(INVALID_TOKEN_MESSAGE),
            })?;

        let claims = data.claims;
        // jsonwebtoken only rejects `exp < now`; a token is dead at its expiry second.
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        if claims.sub != claims.user_id.to_string() {
            return Err(AuthError::unauthorized(INVALID_TOKEN_MESSAGE));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::ErrorKind;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::minutes(15)).unwrap()
    }

    #[test]
    fn test_claims_round_trip() {
        let codec = codec();
        let user_id = Uuid::new_v4();

        let token = codec.issue_access_token(user_id, "ann@x.com").unwrap();
        let claims = codec.validate_access_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "ann@x.com");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_expired_token_is_token_expired() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let user_id = Uuid::new_v4();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            user_id,
            email: "ann@x.com".to_string(),
            iat: now - 600,
            exp: now - 1,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = codec.validate_access_token(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[test]
    fn test_token_expires_at_its_exp_second() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let user_id = Uuid::new_v4();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            user_id,
            email: "ann@x.com".to_string(),
            iat: now - 900,
            exp: now,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = codec.validate_access_token(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[tokio::test]
    async fn test_token_valid_until_lifetime_elapses() {
        let codec = TokenCodec::new(SECRET, Duration::seconds(2)).unwrap();
        let token = codec.issue_access_token(Uuid::new_v4(), "ann@x.com").unwrap();

        assert!(codec.validate_access_token(&token).is_ok());

        tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

        let err = codec.validate_access_token(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExpired);
    }

    #[test]
    fn test_different_secret_is_unauthorized() {
        let other = TokenCodec::new("another-secret-that-is-also-long-enough", Duration::minutes(15))
            .unwrap();
        let token = other.issue_access_token(Uuid::new_v4(), "ann@x.com").unwrap();

        let err = codec().validate_access_token(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.client_message(), INVALID_TOKEN_MESSAGE);
    }

    #[test]
    fn test_malformed_and_forged_share_one_message() {
        let codec = codec();
        let token = codec.issue_access_token(Uuid::new_v4(), "ann@x.com").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');

        let malformed = codec.validate_access_token("not.a.jwt").unwrap_err();
        let forged = codec.validate_access_token(&tampered).unwrap_err();

        assert_eq!(malformed.client_message(), forged.client_message());
        assert_eq!(malformed.kind(), ErrorKind::Unauthorized);
        assert_eq!(forged.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_unexpected_algorithm_rejected() {
        let user_id = Uuid::new_v4();
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            user_id,
            email: "ann@x.com".to_string(),
            iat: now,
            exp: now + 600,
        };
        // Same secret, different HMAC variant: still not the pinned algorithm.
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let err = codec().validate_access_token(&token).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_refresh_identifiers_are_unique() {
        let codec = codec();
        let a = codec.issue_refresh_identifier();
        let b = codec.issue_refresh_identifier();

        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_empty_secret_fails_at_construction() {
        let err = TokenCodec::new("", Duration::minutes(15)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
