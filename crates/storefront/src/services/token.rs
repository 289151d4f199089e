//! Bearer-credential verification.
//!
//! Token verification is a port so route handlers and tests never touch
//! signing keys directly. The production implementation validates HS256
//! JWTs; the static verifier backs the test suites.

use std::collections::HashMap;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use oakline_core::UserId;

/// Errors that can occur verifying a bearer credential.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was supplied where one is required.
    #[error("authentication required")]
    MissingCredentials,

    /// The credential failed signature or claim validation.
    #[error("invalid bearer token")]
    InvalidToken,

    /// The credential is past its expiry.
    #[error("bearer token expired")]
    ExpiredToken,
}

/// Verifies a bearer credential and yields the stable authenticated owner id.
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` and extract the authenticated user id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] or [`AuthError::ExpiredToken`];
    /// there is no guest fallback at this layer.
    fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}

/// Claims carried by Oakline session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user id.
    pub sub: Uuid,
    /// Expiry as a unix timestamp.
    pub exp: u64,
}

/// HS256 JWT verifier.
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Build a verifier from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })?;

        Ok(UserId::new(data.claims.sub))
    }
}

/// Fixed token-to-user mapping for tests.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for `user`, returning self for chaining.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user: UserId) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.tokens
            .get(token)
            .copied()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn secret() -> SecretString {
        SecretString::from("kJ8#mN2$pQ5&rT9@vW3^xZ6!bC4*dF7%")
    }

    fn mint(secret: &SecretString, claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secrecy::ExposeSecret::expose_secret(secret).as_bytes()),
        )
        .expect("encode token")
    }

    fn far_future() -> u64 {
        4_102_444_800 // 2100-01-01
    }

    #[test]
    fn test_verify_round_trip() {
        let secret = secret();
        let user = UserId::random();
        let token = mint(
            &secret,
            &Claims {
                sub: user.as_uuid(),
                exp: far_future(),
            },
        );

        let verifier = JwtVerifier::new(&secret);
        assert_eq!(verifier.verify(&token), Ok(user));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let secret = secret();
        let token = mint(
            &secret,
            &Claims {
                sub: Uuid::new_v4(),
                exp: 1_000_000, // 1970
            },
        );

        let verifier = JwtVerifier::new(&secret);
        assert_eq!(verifier.verify(&token), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn test_verify_rejects_wrong_signature() {
        let user = UserId::random();
        let token = mint(
            &secret(),
            &Claims {
                sub: user.as_uuid(),
                exp: far_future(),
            },
        );

        let other_secret = SecretString::from("zY7!wV4@tS1#qP8$nM5%kJ2^hG9&fD6*");
        let verifier = JwtVerifier::new(&other_secret);
        assert_eq!(verifier.verify(&token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = JwtVerifier::new(&secret());
        assert_eq!(verifier.verify("not-a-jwt"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_static_verifier() {
        let user = UserId::random();
        let verifier = StaticTokenVerifier::new().with_token("alpha", user);
        assert_eq!(verifier.verify("alpha"), Ok(user));
        assert_eq!(verifier.verify("beta"), Err(AuthError::InvalidToken));
    }
}
