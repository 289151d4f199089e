//! Wishlist route handlers.
//!
//! The wishlist is a product set: add is idempotent and remove is a no-op
//! on absent products. All mutation paths are open to guests; only merge
//! requires authentication.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use oakline_core::ProductId;

use crate::db::CollectionStore;
use crate::error::Result;
use crate::middleware::{Identity, RequireGuestHeader, RequireUser};
use crate::models::{ProductSummary, Wishlist};
use crate::services::merge_guest_into_user;
use crate::state::AppState;

/// Wishlist response body.
#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub owner: String,
    pub is_guest: bool,
    pub products: Vec<WishlistItemResponse>,
    pub updated_at: DateTime<Utc>,
}

/// One populated wishlist membership.
#[derive(Debug, Serialize)]
pub struct WishlistItemResponse {
    pub product_id: ProductId,
    /// Product summary; `null` when the product has since been deleted.
    pub product: Option<ProductSummary>,
}

/// Add-to-wishlist request body.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistRequest {
    pub product_id: ProductId,
}

/// Build the response body, populating each membership's product summary.
async fn populate(state: &AppState, wishlist: &Wishlist) -> Result<WishlistResponse> {
    let mut products = Vec::with_capacity(wishlist.products().len());
    for product_id in wishlist.products() {
        let product = state.catalog().lookup(*product_id).await?;
        products.push(WishlistItemResponse {
            product_id: *product_id,
            product: product.map(|p| p.summary()),
        });
    }

    Ok(WishlistResponse {
        owner: wishlist.owner().to_string(),
        is_guest: wishlist.owner().is_guest(),
        products,
        updated_at: wishlist.updated_at(),
    })
}

/// Get the caller's wishlist, creating it lazily on first access.
#[instrument(skip(state, identity))]
pub async fn show(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<WishlistResponse>> {
    let wishlist = state.wishlists().fetch_or_create(identity.owner).await?;
    Ok(Json(populate(&state, &wishlist).await?))
}

/// Add a product to the caller's wishlist. Idempotent.
#[instrument(skip(state, identity))]
pub async fn add(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<AddToWishlistRequest>,
) -> Result<Json<WishlistResponse>> {
    let product = state.catalog().get(body.product_id).await?;

    let mut wishlist = state.wishlists().fetch_or_create(identity.owner).await?;
    if wishlist.add(product.id) {
        state.wishlists().save(&wishlist).await?;
    }

    Ok(Json(populate(&state, &wishlist).await?))
}

/// Remove a product from the caller's wishlist. Removing an absent product
/// is a no-op success.
#[instrument(skip(state, identity))]
pub async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistResponse>> {
    let mut wishlist = state.wishlists().fetch_or_create(identity.owner).await?;
    wishlist.remove(product_id);
    state.wishlists().save(&wishlist).await?;

    Ok(Json(populate(&state, &wishlist).await?))
}

/// Empty the caller's wishlist, preserving the record.
#[instrument(skip(state, identity))]
pub async fn clear(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<WishlistResponse>> {
    let mut wishlist = state.wishlists().fetch_or_create(identity.owner).await?;
    wishlist.clear();
    state.wishlists().save(&wishlist).await?;

    Ok(Json(populate(&state, &wishlist).await?))
}

/// Merge the guest wishlist named by `x-guest-id` into the authenticated
/// caller's wishlist, retiring the guest record.
#[instrument(skip(state, user, guest))]
pub async fn merge(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    RequireGuestHeader(guest): RequireGuestHeader,
) -> Result<Json<WishlistResponse>> {
    let merged = merge_guest_into_user(state.wishlists(), guest, user).await?;
    Ok(Json(populate(&state, &merged).await?))
}
