//! Guest-to-authenticated-owner merge engine.
//!
//! Carts and wishlists share the merge protocol, so the engine is written
//! once against [`OwnedCollection`] and [`CollectionStore`].

use oakline_core::{GuestToken, OwnerId, UserId};

use crate::db::{CollectionStore, RepositoryError};
use crate::models::OwnedCollection;

/// Fold the guest collection into the authenticated owner's collection and
/// retire the guest record.
///
/// The operation is ordered "persist new state, then retire old state": the
/// merged authenticated collection is saved before the guest record is
/// deleted, so a crash in between leaves the guest record intact and the
/// merge retryable. A missing or empty guest collection makes the merge a
/// no-op, which also makes it idempotent - a second invocation (or the
/// loser of two concurrent invocations) finds the guest record already
/// gone and returns the authenticated collection unchanged.
///
/// # Errors
///
/// Propagates store failures; no state has been deleted unless the merged
/// result was already persisted.
pub async fn merge_guest_into_user<C, S>(
    store: &S,
    guest: GuestToken,
    user: UserId,
) -> Result<C, RepositoryError>
where
    C: OwnedCollection + Send,
    S: CollectionStore<C> + ?Sized,
{
    let user_collection = store.fetch_or_create(OwnerId::User(user)).await?;

    let guest_owner = OwnerId::Guest(guest);
    let Some(guest_collection) = store.fetch(guest_owner).await? else {
        tracing::debug!(%guest, %user, "no guest collection to merge");
        return Ok(user_collection);
    };

    if guest_collection.is_empty() {
        tracing::debug!(%guest, %user, "guest collection empty, nothing to merge");
        return Ok(user_collection);
    }

    let mut merged = user_collection;
    merged.absorb(guest_collection);

    store.save(&merged).await?;
    store.delete(guest_owner).await?;

    tracing::info!(%guest, %user, "merged guest collection into user collection");
    Ok(merged)
}
