//! Wishlist model.
//!
//! A wishlist is a true set of product references: adding a product twice
//! leaves a single membership. Insertion order is preserved for display.

use chrono::{DateTime, Utc};

use oakline_core::{OwnerId, ProductId};

use super::OwnedCollection;

/// A wishlist owned by a guest or an authenticated user.
#[derive(Debug, Clone)]
pub struct Wishlist {
    owner: OwnerId,
    products: Vec<ProductId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Wishlist {
    /// Create an empty wishlist for `owner`.
    #[must_use]
    pub fn new(owner: OwnerId) -> Self {
        let now = Utc::now();
        Self {
            owner,
            products: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a wishlist from its stored parts, collapsing any
    /// duplicate memberships a legacy record may carry.
    #[must_use]
    pub fn from_parts(
        owner: OwnerId,
        products: Vec<ProductId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let mut wishlist = Self {
            owner,
            products: Vec::new(),
            created_at,
            updated_at,
        };
        for product in products {
            wishlist.insert(product);
        }
        wishlist.updated_at = updated_at;
        wishlist
    }

    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    #[must_use]
    pub fn products(&self) -> &[ProductId] {
        &self.products
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.products.contains(&product_id)
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Add a product. Adding an already-present product is a no-op.
    ///
    /// Returns whether the membership was newly inserted.
    pub fn add(&mut self, product_id: ProductId) -> bool {
        let inserted = self.insert(product_id);
        if inserted {
            self.updated_at = Utc::now();
        }
        inserted
    }

    /// Remove a product. Removing an absent product is a no-op.
    pub fn remove(&mut self, product_id: ProductId) {
        self.products.retain(|id| *id != product_id);
        self.updated_at = Utc::now();
    }

    /// Empty the wishlist, preserving the record and its owner.
    pub fn clear(&mut self) {
        self.products.clear();
        self.updated_at = Utc::now();
    }

    fn insert(&mut self, product_id: ProductId) -> bool {
        if self.products.contains(&product_id) {
            return false;
        }
        self.products.push(product_id);
        true
    }
}

impl OwnedCollection for Wishlist {
    fn owner(&self) -> OwnerId {
        self.owner
    }

    fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        for product in other.products {
            self.insert(product);
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oakline_core::{GuestToken, UserId};

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = Wishlist::new(OwnerId::Guest(GuestToken::random()));
        let product = ProductId::random();

        assert!(wishlist.add(product));
        assert!(!wishlist.add(product));

        assert_eq!(wishlist.products().len(), 1);
    }

    #[test]
    fn test_remove_absent_product_is_noop() {
        let mut wishlist = Wishlist::new(OwnerId::Guest(GuestToken::random()));
        let kept = ProductId::random();
        wishlist.add(kept);

        wishlist.remove(ProductId::random());

        assert_eq!(wishlist.products(), &[kept]);
    }

    #[test]
    fn test_absorb_is_set_union_preserving_user_order() {
        let shared = ProductId::random();
        let guest_only = ProductId::random();
        let user_only = ProductId::random();

        let mut guest = Wishlist::new(OwnerId::Guest(GuestToken::random()));
        guest.add(shared);
        guest.add(guest_only);

        let mut user = Wishlist::new(OwnerId::User(UserId::random()));
        user.add(user_only);
        user.add(shared);

        user.absorb(guest);

        assert_eq!(user.products(), &[user_only, shared, guest_only]);
    }

    #[test]
    fn test_from_parts_collapses_duplicates() {
        let product = ProductId::random();
        let wishlist = Wishlist::from_parts(
            OwnerId::User(UserId::random()),
            vec![product, product],
            Utc::now(),
            Utc::now(),
        );
        assert_eq!(wishlist.products().len(), 1);
    }

    #[test]
    fn test_clear_preserves_owner() {
        let owner = OwnerId::User(UserId::random());
        let mut wishlist = Wishlist::new(owner);
        wishlist.add(ProductId::random());

        wishlist.clear();

        assert!(wishlist.products().is_empty());
        assert_eq!(wishlist.owner(), owner);
    }
}
