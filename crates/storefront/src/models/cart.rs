//! Shopping cart model.
//!
//! Entries are unique per product: adding an already-present product
//! accumulates its quantity instead of appending a second line. The field
//! is private and every mutation goes through keyed methods, so the
//! uniqueness invariant is structural rather than a side effect of callers
//! scanning the sequence. Derived totals are recomputed after every
//! mutation and are never read back from storage as trusted values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use oakline_core::{CurrencyCode, OwnerId, Price, ProductId};

use super::OwnedCollection;

/// One cart line: product, quantity, and the unit price captured when the
/// product was first added (prices are not re-fetched on every view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
}

impl CartEntry {
    /// The line total `quantity * unit_price`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.line_total(self.quantity)
    }
}

/// Error returned when a keyed mutation references a product with no line.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no cart entry for product {0}")]
pub struct UnknownEntry(pub ProductId);

/// A shopping cart owned by a guest or an authenticated user.
#[derive(Debug, Clone)]
pub struct Cart {
    owner: OwnerId,
    entries: Vec<CartEntry>,
    discount: Decimal,
    currency: CurrencyCode,
    subtotal: Decimal,
    total: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for `owner`.
    #[must_use]
    pub fn new(owner: OwnerId) -> Self {
        let now = Utc::now();
        Self {
            owner,
            entries: Vec::new(),
            discount: Decimal::ZERO,
            currency: CurrencyCode::default(),
            subtotal: Decimal::ZERO,
            total: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a cart from its stored parts.
    ///
    /// Totals are recomputed from the entries, not trusted from storage.
    #[must_use]
    pub fn from_parts(
        owner: OwnerId,
        entries: Vec<CartEntry>,
        discount: Decimal,
        currency: CurrencyCode,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut cart = Self {
            owner,
            entries: Vec::new(),
            discount,
            currency,
            subtotal: Decimal::ZERO,
            total: Decimal::ZERO,
            created_at,
            updated_at,
        };
        // Re-apply through the keyed path so duplicate lines from legacy
        // records collapse instead of resurfacing.
        for entry in entries {
            cart.upsert(entry.product_id, entry.quantity, entry.unit_price);
        }
        cart.recalculate();
        cart.updated_at = updated_at;
        cart
    }

    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn discount(&self) -> Decimal {
        self.discount
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add `quantity` units of a product at `unit_price`.
    ///
    /// If the product already has a line its quantity accumulates and the
    /// originally captured unit price is kept; otherwise a new line is
    /// appended. Callers validate that `quantity` is positive.
    pub fn add(&mut self, product_id: ProductId, quantity: u32, unit_price: Price) {
        self.upsert(product_id, quantity, unit_price);
        self.recalculate();
    }

    /// Remove the line for `product_id`. Removing an absent line is a no-op.
    pub fn remove(&mut self, product_id: ProductId) {
        self.entries.retain(|entry| entry.product_id != product_id);
        self.recalculate();
    }

    /// Set the quantity for an existing line.
    ///
    /// A quantity of zero (the API rejects negatives before this point)
    /// removes the line; a non-positive quantity is never persisted.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownEntry`] if the product has no line in this cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), UnknownEntry> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.product_id == product_id)
            .ok_or(UnknownEntry(product_id))?;

        if quantity == 0 {
            self.entries.retain(|entry| entry.product_id != product_id);
        } else {
            entry.quantity = quantity;
        }
        self.recalculate();
        Ok(())
    }

    /// Apply a flat discount, clamped to `[0, subtotal]`.
    pub fn apply_discount(&mut self, amount: Decimal) {
        self.discount = amount.max(Decimal::ZERO);
        self.recalculate();
    }

    /// Empty the cart, resetting derived totals and discount to zero.
    /// The record and its owner identity are preserved.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.discount = Decimal::ZERO;
        self.recalculate();
    }

    fn upsert(&mut self, product_id: ProductId, quantity: u32, unit_price: Price) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.product_id == product_id)
        {
            entry.quantity = entry.quantity.saturating_add(quantity);
        } else {
            if self.entries.is_empty() {
                self.currency = unit_price.currency;
            }
            self.entries.push(CartEntry {
                product_id,
                quantity,
                unit_price,
            });
        }
    }

    fn recalculate(&mut self) {
        self.subtotal = self
            .entries
            .iter()
            .map(CartEntry::line_total)
            .sum::<Decimal>();
        self.discount = self.discount.min(self.subtotal).max(Decimal::ZERO);
        self.total = self.subtotal - self.discount;
        self.updated_at = Utc::now();
    }
}

impl OwnedCollection for Cart {
    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        for entry in other.entries {
            self.upsert(entry.product_id, entry.quantity, entry.unit_price);
        }
        self.recalculate();
    }
}
