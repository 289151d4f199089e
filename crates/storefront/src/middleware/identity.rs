//! Identity resolution middleware and extractors.
//!
//! Every request resolves to exactly one owner identity:
//!
//! - A valid `Authorization: Bearer ..` credential yields the stable
//!   authenticated user id. An invalid or expired credential is a 401;
//!   there is no fallback to guest identity.
//! - Otherwise the request is anonymous: a well-formed `x-guest-id` header
//!   is reused, anything else mints a fresh random token. The (possibly
//!   newly minted) guest id is echoed in the `x-guest-id` response header
//!   on every anonymous response so the client can persist and resend it.
//!
//! The resolver itself persists nothing; collections are created lazily by
//! the stores on first access.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use oakline_core::{GuestToken, OwnerId, UserId};

use crate::error::AppError;
use crate::state::AppState;

/// The HTTP header carrying the guest identifier in both directions.
pub const GUEST_ID_HEADER: &str = "x-guest-id";

/// The identity resolved for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// The resolved owner.
    pub owner: OwnerId,
    /// Whether the guest token was freshly minted for this request.
    pub minted: bool,
}

/// Extract the bearer token from the `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Parse a well-formed guest token from the request headers.
fn inbound_guest_token(headers: &HeaderMap) -> Option<GuestToken> {
    headers
        .get(GUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Resolve the request's identity from its headers.
///
/// # Errors
///
/// Returns `AppError::Auth` when a bearer credential is present but fails
/// verification.
fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Identity, AppError> {
    if let Some(token) = bearer_token(headers) {
        let user: UserId = state.tokens().verify(token)?;
        return Ok(Identity {
            owner: OwnerId::User(user),
            minted: false,
        });
    }

    match inbound_guest_token(headers) {
        Some(token) => Ok(Identity {
            owner: OwnerId::Guest(token),
            minted: false,
        }),
        None => Ok(Identity {
            owner: OwnerId::Guest(GuestToken::random()),
            minted: true,
        }),
    }
}

/// Middleware that resolves the caller's identity and echoes guest ids.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = match resolve(&state, request.headers()) {
        Ok(identity) => identity,
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(identity);

    let mut response = next.run(request).await;

    if let OwnerId::Guest(token) = identity.owner {
        if let Ok(value) = HeaderValue::from_str(&token.to_string()) {
            response.headers_mut().insert(GUEST_ID_HEADER, value);
        }
    }

    response
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Self>().copied().ok_or_else(|| {
            AppError::Internal("identity middleware not installed".to_string())
        })
    }
}

/// Extractor that requires an authenticated caller.
///
/// Guests are rejected with the structured 401; there is no silent
/// downgrade on routes that mandate authentication.
pub struct RequireUser(pub UserId);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        match identity.owner {
            OwnerId::User(user) => Ok(Self(user)),
            OwnerId::Guest(_) => Err(AppError::Auth(
                crate::services::token::AuthError::MissingCredentials,
            )),
        }
    }
}

/// Extractor for operations that act on a named guest collection (merge).
///
/// Unlike anonymous identity resolution, a missing or malformed header here
/// is a validation failure rather than a reason to mint a fresh token: the
/// caller is naming an existing guest collection, not opening a session.
pub struct RequireGuestHeader(pub GuestToken);

impl<S> FromRequestParts<S> for RequireGuestHeader
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(GUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Validation(format!("{GUEST_ID_HEADER} header is required"))
            })?;

        raw.trim().parse().map(Self).map_err(|_| {
            AppError::Validation(format!("{GUEST_ID_HEADER} header is malformed"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_empty_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_inbound_guest_token_roundtrip() {
        let token = GuestToken::random();
        let mut headers = HeaderMap::new();
        headers.insert(
            GUEST_ID_HEADER,
            HeaderValue::from_str(&token.to_string()).expect("header value"),
        );
        assert_eq!(inbound_guest_token(&headers), Some(token));
    }

    #[test]
    fn test_inbound_guest_token_rejects_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(GUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_eq!(inbound_guest_token(&headers), None);
    }
}
