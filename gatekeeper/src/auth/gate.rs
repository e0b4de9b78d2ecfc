//! Request authentication from an `Authorization` header value.

use super::{
    codec::TokenCodec,
    errors::{AuthError, AuthResult},
    models::AuthContext,
};

pub const MISSING_HEADER_MESSAGE: &str = "Authorization header is required";
pub const BAD_FORMAT_MESSAGE: &str = "Authorization header must be in format: Bearer <token>";

/// Authentication gate
///
/// Turns a raw header value into an [`AuthContext`] or a 401. Transport
/// agnostic: the HTTP layer only passes the header through.
#[derive(Clone, Debug)]
pub struct AuthGate {
    codec: TokenCodec,
}

impl AuthGate {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }

    /// Authenticate a request
    ///
    /// # Arguments
    ///
    /// * `header` - Value of the `Authorization` header, if present
    ///
    /// # Errors
    ///
    /// * `AuthError::Unauthorized` - header missing or blank, not `Bearer <token>`,
    ///   or token invalid
    /// * `AuthError::TokenExpired` - token well-formed but past its expiry
    pub fn authenticate(&self, header: Option<&str>) -> AuthResult<AuthContext> {
        let header = header
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AuthError::unauthorized(MISSING_HEADER_MESSAGE))?;
        let token = bearer_token(header)?;
        let claims = self.codec.validate_access_token(token)?;
        Ok(claims.into())
    }
}

/// Split `Bearer <token>` on the first space. Scheme is case-insensitive.
fn bearer_token(header: &str) -> AuthResult<&str> {
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(AuthError::unauthorized(BAD_FORMAT_MESSAGE)),
    }
}
