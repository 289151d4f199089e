//! Owner identity for guest-mergeable collections.
//!
//! A cart or wishlist belongs to exactly one owner: either an authenticated
//! user (stable [`UserId`] extracted from a verified bearer token) or an
//! anonymous guest (ephemeral [`GuestToken`] round-tripped in a header).
//! Collections are keyed by the PAIR `(owner id, guest flag)`, so a guest
//! collection and an authenticated collection can coexist until a merge
//! retires the guest side.

use core::fmt;

use uuid::Uuid;

use crate::{GuestToken, UserId};

/// Errors that can occur when reconstructing an [`OwnerId`] from storage.
#[derive(thiserror::Error, Debug, Clone)]
pub enum OwnerIdError {
    /// The stored owner field is not a plain UUID.
    #[error("malformed owner identifier: {0}")]
    Malformed(String),
}

/// The owner of a cart or wishlist.
///
/// The enum makes the guest/authenticated split structural: a guest token
/// can never compare equal to a user id, and the guest flag cannot drift
/// from the identifier it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerId {
    /// Authenticated owner, stable across sessions.
    User(UserId),
    /// Anonymous owner, retired when its collection is merged.
    Guest(GuestToken),
}

impl OwnerId {
    /// Whether this owner is an anonymous guest.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }

    /// The raw UUID behind the identifier.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        match self {
            Self::User(id) => id.as_uuid(),
            Self::Guest(token) => token.as_uuid(),
        }
    }

    /// Reconstruct an owner from its storage representation.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerIdError::Malformed`] if `owner_id` is not a plain
    /// UUID. Stores are expected to repair legacy embedded-payload rows
    /// before calling this.
    pub fn from_parts(owner_id: &str, is_guest: bool) -> Result<Self, OwnerIdError> {
        let uuid: Uuid = owner_id
            .parse()
            .map_err(|_| OwnerIdError::Malformed(owner_id.to_string()))?;

        Ok(if is_guest {
            Self::Guest(GuestToken::new(uuid))
        } else {
            Self::User(UserId::new(uuid))
        })
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_uuid())
    }
}

impl From<UserId> for OwnerId {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

impl From<GuestToken> for OwnerId {
    fn from(token: GuestToken) -> Self {
        Self::Guest(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_never_equals_user_for_same_uuid() {
        let uuid = Uuid::new_v4();
        let guest = OwnerId::Guest(GuestToken::new(uuid));
        let user = OwnerId::User(UserId::new(uuid));
        assert_ne!(guest, user);
        assert_eq!(guest.as_uuid(), user.as_uuid());
    }

    #[test]
    fn test_from_parts_round_trip() {
        let owner = OwnerId::Guest(GuestToken::random());
        let rebuilt = OwnerId::from_parts(&owner.to_string(), true).expect("valid");
        assert_eq!(owner, rebuilt);
        assert!(rebuilt.is_guest());
    }

    #[test]
    fn test_from_parts_rejects_embedded_payload() {
        let err = OwnerId::from_parts(r#"{"productId":"x","quantity":2}"#, true);
        assert!(matches!(err, Err(OwnerIdError::Malformed(_))));
    }
}
