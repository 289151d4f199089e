//! Storage for the storefront.
//!
//! # Stores
//!
//! Persistence is reached exclusively through injected store traits so
//! every component can run against the Postgres implementations in
//! production and the in-memory fakes in tests:
//!
//! - [`CollectionStore`] - generic owned-collection persistence (carts and
//!   wishlists share the contract)
//! - [`WishlistStore`] - adds the reverse product lookup used by
//!   price-change notification
//! - [`CatalogStore`] - product catalog queries and admin CRUD
//!
//! First access by a given owner creates the record lazily via the store's
//! atomic insert-if-absent primitive; there is no read-then-write creation
//! guarded in application code.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run on
//! startup via `sqlx::migrate!`.

pub mod memory;
pub mod postgres;
pub mod repair;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use oakline_core::{OwnerId, ProductId};

use crate::models::{
    OwnedCollection, Product, ProductCategory, ProductType, Wishlist,
};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Errors that can occur in store implementations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be decoded into its domain shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A uniqueness conflict the atomic upsert did not absorb. Retryable.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Persistence contract shared by every guest-mergeable owned collection.
///
/// `fetch_or_create` must be safe under concurrent first access from the
/// same owner: implementations use an atomic insert-if-absent at the store
/// level, never a separate read-then-write.
#[async_trait]
pub trait CollectionStore<C: OwnedCollection>: Send + Sync {
    /// Load the collection for `owner`, if one exists.
    async fn fetch(&self, owner: OwnerId) -> Result<Option<C>, RepositoryError>;

    /// Load the collection for `owner`, creating an empty one atomically
    /// if none exists yet.
    async fn fetch_or_create(&self, owner: OwnerId) -> Result<C, RepositoryError>;

    /// Persist the collection under its owner key.
    async fn save(&self, collection: &C) -> Result<(), RepositoryError>;

    /// Delete the record for `owner` entirely. Deleting an absent record
    /// is a no-op.
    async fn delete(&self, owner: OwnerId) -> Result<(), RepositoryError>;
}

/// Wishlist persistence: the collection contract plus the reverse lookup
/// that price-change notification needs.
#[async_trait]
pub trait WishlistStore: CollectionStore<Wishlist> {
    /// All wishlists containing `product_id`.
    async fn find_by_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Wishlist>, RepositoryError>;
}

/// Catalog filter criteria. Empty vectors / `None` mean "no constraint".
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Free-text search over name, sku, tags, and collection.
    pub search: Option<String>,
    pub product_types: Vec<ProductType>,
    pub categories: Vec<ProductCategory>,
    pub collection: Option<String>,
    pub color_families: Vec<String>,
    pub material: Option<String>,
    pub configurations: Vec<String>,
    pub designer: Option<String>,
    pub tag: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    /// Whether `product` satisfies every populated criterion.
    ///
    /// This is the reference semantics; the Postgres store expresses the
    /// same predicate in SQL.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystack_hit = product.name.to_lowercase().contains(&needle)
                || product.sku.to_lowercase().contains(&needle)
                || product
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
                || product
                    .attributes
                    .collection
                    .as_ref()
                    .is_some_and(|c| c.to_lowercase().contains(&needle));
            if !haystack_hit {
                return false;
            }
        }

        if !self.product_types.is_empty() && !self.product_types.contains(&product.product_type) {
            return false;
        }

        if !self.categories.is_empty() && !self.categories.contains(&product.category) {
            return false;
        }

        if let Some(collection) = &self.collection {
            let matched = product
                .attributes
                .collection
                .as_ref()
                .is_some_and(|c| c.eq_ignore_ascii_case(collection));
            if !matched {
                return false;
            }
        }

        if !self.color_families.is_empty() {
            let matched = product
                .attributes
                .color
                .as_ref()
                .is_some_and(|c| self.color_families.iter().any(|f| c.family.eq_ignore_ascii_case(f)));
            if !matched {
                return false;
            }
        }

        if let Some(material) = &self.material {
            let matched = product
                .attributes
                .material
                .as_ref()
                .is_some_and(|m| m.to_lowercase().contains(&material.to_lowercase()));
            if !matched {
                return false;
            }
        }

        if !self.configurations.is_empty() {
            let matched = product
                .attributes
                .configuration
                .as_ref()
                .is_some_and(|c| self.configurations.iter().any(|want| c.eq_ignore_ascii_case(want)));
            if !matched {
                return false;
            }
        }

        if let Some(designer) = &self.designer {
            if !product
                .designer
                .name
                .to_lowercase()
                .contains(&designer.to_lowercase())
            {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            let needle = tag.to_lowercase();
            if !product.tags.iter().any(|t| t.to_lowercase().contains(&needle)) {
                return false;
            }
        }

        if let Some(min) = self.min_price {
            if product.price.amount < min {
                return false;
            }
        }

        if let Some(max) = self.max_price {
            if product.price.amount > max {
                return false;
            }
        }

        true
    }
}

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first (default).
    #[default]
    NewestFirst,
    OldestFirst,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl ProductSort {
    /// Parse the API's sort parameter (`-createdAt`, `price`, `-price`,
    /// `name`). Unknown values fall back to the default.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "createdAt" => Self::OldestFirst,
            "price" => Self::PriceAsc,
            "-price" => Self::PriceDesc,
            "name" => Self::NameAsc,
            _ => Self::NewestFirst,
        }
    }
}

/// Pagination window.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Build a window from raw query values, clamping to sane bounds.
    #[must_use]
    pub fn clamped(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Row offset for this window.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.limit as u64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::clamped(None, None)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: u64,
    pub limit: u32,
}

/// Aggregate catalog statistics.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CatalogStats {
    pub total_products: u64,
    pub average_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub total_inventory: i64,
}

/// Distinct values for the filterable attributes.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FilterOptions {
    pub types: Vec<String>,
    pub categories: Vec<String>,
    pub collections: Vec<String>,
    pub configurations: Vec<String>,
    pub color_families: Vec<String>,
    pub materials: Vec<String>,
    pub finishes: Vec<String>,
    pub door_counts: Vec<u8>,
}

/// A collection with a representative image.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub image: Option<String>,
}

/// Product catalog persistence.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Filtered, sorted, paginated listing.
    async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Pagination,
    ) -> Result<ProductPage, RepositoryError>;

    /// Load a product by id.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a new product. Fails with [`RepositoryError::Conflict`] on a
    /// duplicate SKU.
    async fn insert(&self, product: &Product) -> Result<(), RepositoryError>;

    /// Bulk-insert products; returns how many were written.
    async fn insert_many(&self, products: &[Product]) -> Result<u64, RepositoryError>;

    /// Replace an existing product. Returns `false` if no such product.
    async fn update(&self, product: &Product) -> Result<bool, RepositoryError>;

    /// Delete a product. Returns `false` if no such product.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Aggregate statistics over the whole catalog.
    async fn stats(&self) -> Result<CatalogStats, RepositoryError>;

    /// Distinct values for the filterable attributes.
    async fn filter_options(&self) -> Result<FilterOptions, RepositoryError>;

    /// Distinct collections with a representative image.
    async fn collections(&self) -> Result<Vec<CollectionSummary>, RepositoryError>;

    /// Products in a collection (case-insensitive exact name).
    async fn by_collection(&self, name: &str) -> Result<Vec<Product>, RepositoryError>;

    /// Up to `limit` products related by type, category, collection, or
    /// shared category labels; never includes the product itself.
    async fn related(&self, id: ProductId, limit: usize)
    -> Result<Vec<Product>, RepositoryError>;
}

/// Sort a slice of products in place. Shared by the in-memory store and
/// the relatedness fallback paths.
pub(crate) fn sort_products(products: &mut [Product], sort: ProductSort) {
    match sort {
        ProductSort::NewestFirst => {
            products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        ProductSort::OldestFirst => {
            products.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        ProductSort::PriceAsc => {
            products.sort_by(|a, b| a.price.amount.cmp(&b.price.amount));
        }
        ProductSort::PriceDesc => {
            products.sort_by(|a, b| b.price.amount.cmp(&a.price.amount));
        }
        ProductSort::NameAsc => products.sort_by(|a, b| a.name.cmp(&b.name)),
    }
}
