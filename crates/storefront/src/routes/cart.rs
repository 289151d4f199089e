//! Cart route handlers.
//!
//! Anonymous and authenticated callers share the read/add/clear paths;
//! remove, update, discount, and merge require authentication. Responses
//! embed a product summary per line so clients never join against the
//! catalog themselves.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use oakline_core::{CurrencyCode, OwnerId, Price, ProductId};

use crate::db::CollectionStore;
use crate::error::{AppError, Result};
use crate::middleware::{Identity, RequireGuestHeader, RequireUser};
use crate::models::{Cart, ProductSummary};
use crate::services::merge_guest_into_user;
use crate::state::AppState;

/// One populated cart line.
#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub product_id: ProductId,
    /// Product summary; `null` when the product has since been deleted.
    pub product: Option<ProductSummary>,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Decimal,
}

/// Cart response body.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub owner: String,
    pub is_guest: bool,
    pub items: Vec<CartItemResponse>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub updated_at: DateTime<Utc>,
}

/// Build the response body, populating each line's product summary.
async fn populate(state: &AppState, cart: &Cart) -> Result<CartResponse> {
    let mut items = Vec::with_capacity(cart.entries().len());
    for entry in cart.entries() {
        let product = state.catalog().lookup(entry.product_id).await?;
        items.push(CartItemResponse {
            product_id: entry.product_id,
            product: product.map(|p| p.summary()),
            quantity: entry.quantity,
            unit_price: entry.unit_price,
            line_total: entry.line_total(),
        });
    }

    Ok(CartResponse {
        owner: cart.owner().to_string(),
        is_guest: cart.owner().is_guest(),
        items,
        subtotal: cart.subtotal(),
        discount: cart.discount(),
        total: cart.total(),
        currency: cart.currency(),
        updated_at: cart.updated_at(),
    })
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Remove-from-cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Update-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Apply-discount request body.
#[derive(Debug, Deserialize)]
pub struct ApplyDiscountRequest {
    pub amount: Decimal,
}

/// Get the caller's cart, creating it lazily on first access.
#[instrument(skip(state, identity))]
pub async fn show(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<CartResponse>> {
    let cart = state.carts().fetch_or_create(identity.owner).await?;
    Ok(Json(populate(&state, &cart).await?))
}

/// Add an item to the caller's cart.
///
/// The referenced product must exist; its current price is captured on the
/// line at add time.
#[instrument(skip(state, identity))]
pub async fn add(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    let quantity = body.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::Validation(
            "quantity must be a positive integer".to_string(),
        ));
    }

    let product = state.catalog().get(body.product_id).await?;

    let mut cart = state.carts().fetch_or_create(identity.owner).await?;
    cart.add(product.id, quantity, product.price);
    state.carts().save(&cart).await?;

    Ok(Json(populate(&state, &cart).await?))
}

/// Remove an item from the caller's cart.
///
/// Removing a product with no line is a no-op success.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<RemoveFromCartRequest>,
) -> Result<Json<CartResponse>> {
    let owner = OwnerId::User(user);
    let mut cart = state.carts().fetch_or_create(owner).await?;
    cart.remove(body.product_id);
    state.carts().save(&cart).await?;

    Ok(Json(populate(&state, &cart).await?))
}

/// Set the quantity of an existing cart line.
///
/// A quantity of zero or less removes the line; a non-positive quantity is
/// never persisted.
#[instrument(skip(state, user))]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>> {
    let owner = OwnerId::User(user);
    let mut cart = state.carts().fetch_or_create(owner).await?;

    if body.quantity <= 0 {
        cart.remove(body.product_id);
    } else {
        let quantity = u32::try_from(body.quantity)
            .map_err(|_| AppError::Validation("quantity out of range".to_string()))?;
        cart.set_quantity(body.product_id, quantity)
            .map_err(|err| AppError::NotFound(err.to_string()))?;
    }

    state.carts().save(&cart).await?;
    Ok(Json(populate(&state, &cart).await?))
}

/// Apply a flat discount to the caller's cart.
#[instrument(skip(state, user))]
pub async fn apply_discount(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<ApplyDiscountRequest>,
) -> Result<Json<CartResponse>> {
    if body.amount.is_sign_negative() {
        return Err(AppError::Validation(
            "discount must not be negative".to_string(),
        ));
    }

    let owner = OwnerId::User(user);
    let mut cart = state.carts().fetch_or_create(owner).await?;
    cart.apply_discount(body.amount);
    state.carts().save(&cart).await?;

    Ok(Json(populate(&state, &cart).await?))
}

/// Empty the caller's cart, preserving the record.
#[instrument(skip(state, identity))]
pub async fn clear(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<CartResponse>> {
    let mut cart = state.carts().fetch_or_create(identity.owner).await?;
    cart.clear();
    state.carts().save(&cart).await?;

    Ok(Json(populate(&state, &cart).await?))
}

/// Merge the guest cart named by `x-guest-id` into the authenticated
/// caller's cart, retiring the guest record.
#[instrument(skip(state, user, guest))]
pub async fn merge(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    RequireGuestHeader(guest): RequireGuestHeader,
) -> Result<(StatusCode, Json<CartResponse>)> {
    let merged = merge_guest_into_user(state.carts(), guest, user).await?;
    Ok((StatusCode::OK, Json(populate(&state, &merged).await?)))
}
