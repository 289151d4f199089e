//! Catalog service.
//!
//! Wraps the catalog store with short-TTL response caching on the hot read
//! paths (the listing, stats, and collection queries are the most expensive
//! and the most cacheable), admin CRUD with validation, and price-change
//! detection feeding the notification port.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use serde::Deserialize;

use oakline_core::{OwnerId, Price, ProductId};

use crate::db::{
    CatalogStats, CatalogStore, CollectionSummary, FilterOptions, Pagination, ProductFilter,
    ProductPage, ProductSort, WishlistStore,
};
use crate::error::{AppError, Result};
use crate::models::{
    Designer, Inventory, Product, ProductAttributes, ProductCategory, ProductImage, ProductType,
};
use crate::services::notify::PriceChangeNotifier;

/// Listing/collection cache TTL.
const LIST_TTL: Duration = Duration::from_secs(300);
/// Stats cache TTL.
const STATS_TTL: Duration = Duration::from_secs(600);
/// Related-products cap.
const RELATED_LIMIT: usize = 5;

/// Incoming product payload for create/update/bulk operations.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub product_type: ProductType,
    pub category: ProductCategory,
    pub price: Price,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub attributes: ProductAttributes,
    pub designer: Designer,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

impl ProductDraft {
    fn validate(&self) -> Result<()> {
        if self.sku.trim().is_empty() {
            return Err(AppError::Validation("sku must not be empty".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        if self.price.amount.is_sign_negative() {
            return Err(AppError::Validation(
                "price must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    fn into_product(self, id: ProductId) -> Product {
        let now = Utc::now();
        Product {
            id,
            sku: self.sku,
            name: self.name,
            description: self.description,
            product_type: self.product_type,
            category: self.category,
            price: self.price,
            inventory: self.inventory,
            categories: self.categories,
            attributes: self.attributes,
            designer: self.designer,
            images: self.images,
            tags: self.tags,
            features: self.features,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Catalog reads and admin writes.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    wishlists: Arc<dyn WishlistStore>,
    notifier: Arc<dyn PriceChangeNotifier>,
    list_cache: Cache<String, Arc<ProductPage>>,
    stats_cache: Cache<u8, CatalogStats>,
    collections_cache: Cache<u8, Arc<Vec<CollectionSummary>>>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        wishlists: Arc<dyn WishlistStore>,
        notifier: Arc<dyn PriceChangeNotifier>,
    ) -> Self {
        Self {
            store,
            wishlists,
            notifier,
            list_cache: Cache::builder().time_to_live(LIST_TTL).build(),
            stats_cache: Cache::builder().time_to_live(STATS_TTL).build(),
            collections_cache: Cache::builder().time_to_live(LIST_TTL).build(),
        }
    }

    /// Filtered, paginated listing, cached per distinct query.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Pagination,
    ) -> Result<Arc<ProductPage>> {
        let key = format!("{filter:?}|{sort:?}|{}|{}", page.page, page.limit);
        if let Some(cached) = self.list_cache.get(&key).await {
            return Ok(cached);
        }

        let result = Arc::new(self.store.list(filter, sort, page).await?);
        self.list_cache.insert(key, Arc::clone(&result)).await;
        Ok(result)
    }

    /// Load a product, or fail with `NotFound`.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.lookup(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {id}")))
    }

    /// Load a product if it exists.
    ///
    /// Used when populating cart and wishlist entries, where a product
    /// deleted after being added is not an error.
    pub async fn lookup(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.store.get(id).await?)
    }

    /// Up to five products related to `id`.
    pub async fn related(&self, id: ProductId) -> Result<Vec<Product>> {
        // 404 on an unknown anchor, matching the detail route.
        let _ = self.get(id).await?;
        Ok(self.store.related(id, RELATED_LIMIT).await?)
    }

    /// Aggregate catalog statistics, cached.
    pub async fn stats(&self) -> Result<CatalogStats> {
        if let Some(cached) = self.stats_cache.get(&0).await {
            return Ok(cached);
        }
        let stats = self.store.stats().await?;
        self.stats_cache.insert(0, stats).await;
        Ok(stats)
    }

    /// Distinct values for the filterable attributes.
    pub async fn filter_options(&self) -> Result<FilterOptions> {
        Ok(self.store.filter_options().await?)
    }

    /// Distinct collections with representative images, cached.
    pub async fn collections(&self) -> Result<Arc<Vec<CollectionSummary>>> {
        if let Some(cached) = self.collections_cache.get(&0).await {
            return Ok(cached);
        }
        let collections = Arc::new(self.store.collections().await?);
        self.collections_cache
            .insert(0, Arc::clone(&collections))
            .await;
        Ok(collections)
    }

    /// Products in a collection (case-insensitive).
    pub async fn by_collection(&self, name: &str) -> Result<Vec<Product>> {
        Ok(self.store.by_collection(name).await?)
    }

    /// Create a product.
    pub async fn create(&self, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let product = draft.into_product(ProductId::random());
        self.store.insert(&product).await?;
        self.invalidate_caches().await;
        Ok(product)
    }

    /// Bulk-insert products; returns how many were written.
    pub async fn bulk_insert(&self, drafts: Vec<ProductDraft>) -> Result<u64> {
        for draft in &drafts {
            draft.validate()?;
        }
        let products: Vec<Product> = drafts
            .into_iter()
            .map(|draft| draft.into_product(ProductId::random()))
            .collect();
        let written = self.store.insert_many(&products).await?;
        self.invalidate_caches().await;
        Ok(written)
    }

    /// Replace a product. A price change notifies wishlist holders.
    pub async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Product> {
        draft.validate()?;
        let existing = self.get(id).await?;

        let mut updated = draft.into_product(id);
        updated.created_at = existing.created_at;

        if !self.store.update(&updated).await? {
            return Err(AppError::NotFound(format!("product {id}")));
        }
        self.invalidate_caches().await;

        if existing.price.amount != updated.price.amount {
            self.notify_price_change(&updated, existing.price).await;
        }

        Ok(updated)
    }

    /// Delete a product, or fail with `NotFound`.
    pub async fn remove(&self, id: ProductId) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(format!("product {id}")));
        }
        self.invalidate_caches().await;
        Ok(())
    }

    async fn notify_price_change(&self, product: &Product, previous: Price) {
        // Notification is best-effort: a lookup failure must not fail the
        // update that already persisted.
        match self.wishlists.find_by_product(product.id).await {
            Ok(wishlists) => {
                let holders: Vec<OwnerId> =
                    wishlists.iter().map(crate::models::Wishlist::owner).collect();
                self.notifier
                    .price_changed(product, previous, &holders)
                    .await;
            }
            Err(err) => {
                tracing::warn!(
                    product_id = %product.id,
                    error = %err,
                    "failed to resolve wishlist holders for price change"
                );
            }
        }
    }

    async fn invalidate_caches(&self) {
        self.list_cache.invalidate_all();
        self.stats_cache.invalidate_all();
        self.collections_cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oakline_core::CurrencyCode;
    use rust_decimal::Decimal;

    use crate::db::memory::{InMemoryCatalogStore, InMemoryWishlistStore};
    use crate::services::notify::testing::RecordingNotifier;

    fn draft(sku: &str, amount: i64) -> ProductDraft {
        ProductDraft {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            product_type: ProductType::Wardrobe,
            category: ProductCategory::SlidingWardrobe,
            price: Price::new(Decimal::new(amount, 0), CurrencyCode::INR),
            inventory: Inventory::default(),
            categories: vec![],
            attributes: ProductAttributes::default(),
            designer: Designer {
                name: "A. Kulkarni".to_string(),
                area: "Mumbai".to_string(),
            },
            images: vec![],
            tags: vec![],
            features: vec![],
        }
    }

    fn service_with_notifier() -> (CatalogService, Arc<RecordingNotifier>, Arc<InMemoryWishlistStore>)
    {
        let wishlists = Arc::new(InMemoryWishlistStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let service = CatalogService::new(
            Arc::new(InMemoryCatalogStore::new()),
            Arc::clone(&wishlists) as Arc<dyn WishlistStore>,
            Arc::clone(&notifier) as Arc<dyn PriceChangeNotifier>,
        );
        (service, notifier, wishlists)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (service, _, _) = service_with_notifier();
        let created = service.create(draft("OAK-1", 100)).await.expect("create");
        let fetched = service.get(created.id).await.expect("get");
        assert_eq!(fetched.sku, "OAK-1");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_sku() {
        let (service, _, _) = service_with_notifier();
        let mut bad = draft("OAK-1", 100);
        bad.sku = "  ".to_string();
        let err = service.create(bad).await.expect_err("invalid");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_product_is_not_found() {
        let (service, _, _) = service_with_notifier();
        let err = service.get(ProductId::random()).await.expect_err("missing");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_price_change_notifies_wishlist_holders() {
        use crate::db::CollectionStore;
        use oakline_core::{GuestToken, OwnerId};

        let (service, notifier, wishlists) = service_with_notifier();
        let product = service.create(draft("OAK-1", 100)).await.expect("create");

        let owner = OwnerId::Guest(GuestToken::random());
        let mut wishlist = wishlists.fetch_or_create(owner).await.expect("wishlist");
        wishlist.add(product.id);
        wishlists.save(&wishlist).await.expect("save");

        let updated = service
            .update(product.id, draft("OAK-1", 150))
            .await
            .expect("update");
        assert_eq!(updated.price.amount, Decimal::new(150, 0));

        let events = notifier.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].previous.amount, Decimal::new(100, 0));
        assert_eq!(events[0].holders, vec![owner]);
    }

    #[tokio::test]
    async fn test_update_without_price_change_stays_quiet() {
        let (service, notifier, _) = service_with_notifier();
        let product = service.create(draft("OAK-1", 100)).await.expect("create");

        service
            .update(product.id, draft("OAK-1", 100))
            .await
            .expect("update");

        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_update_preserves_created_at() {
        let (service, _, _) = service_with_notifier();
        let product = service.create(draft("OAK-1", 100)).await.expect("create");

        let updated = service
            .update(product.id, draft("OAK-1-R2", 120))
            .await
            .expect("update");

        assert_eq!(updated.created_at, product.created_at);
        assert_eq!(updated.sku, "OAK-1-R2");
    }

    #[tokio::test]
    async fn test_mutation_invalidates_stats_cache() {
        let (service, _, _) = service_with_notifier();
        service.create(draft("OAK-1", 100)).await.expect("create");

        let before = service.stats().await.expect("stats");
        assert_eq!(before.total_products, 1);

        service.create(draft("OAK-2", 300)).await.expect("create");

        let after = service.stats().await.expect("stats");
        assert_eq!(after.total_products, 2);
        assert_eq!(after.average_price, Decimal::new(200, 0));
    }

    #[tokio::test]
    async fn test_remove_unknown_product_is_not_found() {
        let (service, _, _) = service_with_notifier();
        let err = service
            .remove(ProductId::random())
            .await
            .expect_err("missing");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
