//! Domain models for the storefront.
//!
//! Carts and wishlists share one structural pattern: an owned collection
//! keyed by [`OwnerId`] that a guest can build up anonymously and later
//! merge into an authenticated owner's copy. [`OwnedCollection`] captures
//! the part of that pattern the merge engine needs.

pub mod cart;
pub mod product;
pub mod wishlist;

pub use cart::{Cart, CartEntry, UnknownEntry};
pub use product::{
    ColorAttribute, Designer, Dimensions, Inventory, Product, ProductAttributes,
    ProductCategory, ProductImage, ProductSummary, ProductType, UnknownLabel,
};
pub use wishlist::Wishlist;

use oakline_core::OwnerId;

/// A collection owned by a single guest or authenticated user.
///
/// Implementors keep their owner immutable for the life of the record; the
/// merge engine never flips a guest collection to authenticated, it folds
/// the guest contents into the authenticated copy and deletes the guest
/// record.
pub trait OwnedCollection {
    /// The owner this collection belongs to.
    fn owner(&self) -> OwnerId;

    /// Whether the collection has no entries.
    fn is_empty(&self) -> bool;

    /// Fold `other`'s entries into this collection.
    ///
    /// Cart semantics: quantities accumulate per product, captured unit
    /// prices carry over for new lines. Wishlist semantics: set union.
    fn absorb(&mut self, other: Self);
}
