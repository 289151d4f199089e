//! In-memory store implementations.
//!
//! Used by the test suites and local development. Each store keeps its
//! records behind one `RwLock`, so insert-if-absent is a single critical
//! section and first-access creation races cannot duplicate records.

use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;

use oakline_core::{OwnerId, ProductId};

use crate::models::{Cart, OwnedCollection, Product, Wishlist};

use super::{
    CatalogStats, CatalogStore, CollectionStore, CollectionSummary, FilterOptions, Pagination,
    ProductFilter, ProductPage, ProductSort, RepositoryError, WishlistStore, sort_products,
};

/// In-memory cart store.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<OwnerId, Cart>>,
}

impl InMemoryCartStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<OwnerId, Cart>> {
        self.carts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OwnerId, Cart>> {
        self.carts.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CollectionStore<Cart> for InMemoryCartStore {
    async fn fetch(&self, owner: OwnerId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.read().get(&owner).cloned())
    }

    async fn fetch_or_create(&self, owner: OwnerId) -> Result<Cart, RepositoryError> {
        let mut carts = self.write();
        Ok(carts.entry(owner).or_insert_with(|| Cart::new(owner)).clone())
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        self.write().insert(cart.owner(), cart.clone());
        Ok(())
    }

    async fn delete(&self, owner: OwnerId) -> Result<(), RepositoryError> {
        self.write().remove(&owner);
        Ok(())
    }
}

/// In-memory wishlist store.
#[derive(Debug, Default)]
pub struct InMemoryWishlistStore {
    wishlists: RwLock<HashMap<OwnerId, Wishlist>>,
}

impl InMemoryWishlistStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<OwnerId, Wishlist>> {
        self.wishlists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OwnerId, Wishlist>> {
        self.wishlists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CollectionStore<Wishlist> for InMemoryWishlistStore {
    async fn fetch(&self, owner: OwnerId) -> Result<Option<Wishlist>, RepositoryError> {
        Ok(self.read().get(&owner).cloned())
    }

    async fn fetch_or_create(&self, owner: OwnerId) -> Result<Wishlist, RepositoryError> {
        let mut wishlists = self.write();
        Ok(wishlists
            .entry(owner)
            .or_insert_with(|| Wishlist::new(owner))
            .clone())
    }

    async fn save(&self, wishlist: &Wishlist) -> Result<(), RepositoryError> {
        self.write().insert(wishlist.owner(), wishlist.clone());
        Ok(())
    }

    async fn delete(&self, owner: OwnerId) -> Result<(), RepositoryError> {
        self.write().remove(&owner);
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for InMemoryWishlistStore {
    async fn find_by_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Wishlist>, RepositoryError> {
        Ok(self
            .read()
            .values()
            .filter(|wishlist| wishlist.contains(product_id))
            .cloned()
            .collect())
    }
}

/// In-memory catalog store.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ProductId, Product>> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ProductId, Product>> {
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Pagination,
    ) -> Result<ProductPage, RepositoryError> {
        let mut matched: Vec<Product> = self
            .read()
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect();
        sort_products(&mut matched, sort);

        let total_products = matched.len() as u64;
        let total_pages = u32::try_from(total_products.div_ceil(u64::from(page.limit)))
            .unwrap_or(u32::MAX);

        let products = matched
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .collect();

        Ok(ProductPage {
            products,
            current_page: page.page,
            total_pages,
            total_products,
            limit: page.limit,
        })
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.read().get(&id).cloned())
    }

    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.write();
        if products.contains_key(&product.id)
            || products.values().any(|p| p.sku == product.sku)
        {
            return Err(RepositoryError::Conflict(format!(
                "product with sku {} already exists",
                product.sku
            )));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn insert_many(&self, batch: &[Product]) -> Result<u64, RepositoryError> {
        for product in batch {
            self.insert(product).await?;
        }
        Ok(batch.len() as u64)
    }

    async fn update(&self, product: &Product) -> Result<bool, RepositoryError> {
        let mut products = self.write();
        if !products.contains_key(&product.id) {
            return Ok(false);
        }
        products.insert(product.id, product.clone());
        Ok(true)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.write().remove(&id).is_some())
    }

    async fn stats(&self) -> Result<CatalogStats, RepositoryError> {
        let products = self.read();
        if products.is_empty() {
            return Ok(CatalogStats::default());
        }

        let total_products = products.len() as u64;
        let sum: Decimal = products.values().map(|p| p.price.amount).sum();
        let min_price = products
            .values()
            .map(|p| p.price.amount)
            .min()
            .unwrap_or(Decimal::ZERO);
        let max_price = products
            .values()
            .map(|p| p.price.amount)
            .max()
            .unwrap_or(Decimal::ZERO);
        let total_inventory = products
            .values()
            .map(|p| i64::from(p.inventory.quantity))
            .sum();

        // Match the SQL ROUND(AVG(..), 2) shape exactly.
        let mut average_price = sum / Decimal::from(total_products);
        average_price.rescale(2);

        Ok(CatalogStats {
            total_products,
            average_price,
            min_price,
            max_price,
            total_inventory,
        })
    }

    async fn filter_options(&self) -> Result<FilterOptions, RepositoryError> {
        let products = self.read();

        let mut types = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut collections = BTreeSet::new();
        let mut configurations = BTreeSet::new();
        let mut color_families = BTreeSet::new();
        let mut materials = BTreeSet::new();
        let mut finishes = BTreeSet::new();
        let mut door_counts = BTreeSet::new();

        for product in products.values() {
            types.insert(product.product_type.as_str().to_string());
            categories.insert(product.category.as_str().to_string());
            let attrs = &product.attributes;
            collections.extend(attrs.collection.clone());
            configurations.extend(attrs.configuration.clone());
            if let Some(color) = &attrs.color {
                color_families.insert(color.family.clone());
            }
            materials.extend(attrs.material.clone());
            finishes.extend(attrs.finish.clone());
            door_counts.extend(attrs.doors);
        }

        Ok(FilterOptions {
            types: types.into_iter().collect(),
            categories: categories.into_iter().collect(),
            collections: collections.into_iter().collect(),
            configurations: configurations.into_iter().collect(),
            color_families: color_families.into_iter().collect(),
            materials: materials.into_iter().collect(),
            finishes: finishes.into_iter().collect(),
            door_counts: door_counts.into_iter().collect(),
        })
    }

    async fn collections(&self) -> Result<Vec<CollectionSummary>, RepositoryError> {
        let products = self.read();
        let mut summaries: HashMap<String, CollectionSummary> = HashMap::new();

        for product in products.values() {
            let Some(name) = product.attributes.collection.clone() else {
                continue;
            };
            summaries
                .entry(name.clone())
                .or_insert_with(|| CollectionSummary {
                    name,
                    image: product.primary_image().map(|img| img.url.clone()),
                });
        }

        let mut result: Vec<CollectionSummary> = summaries.into_values().collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn by_collection(&self, name: &str) -> Result<Vec<Product>, RepositoryError> {
        let mut matched: Vec<Product> = self
            .read()
            .values()
            .filter(|product| {
                product
                    .attributes
                    .collection
                    .as_ref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(name))
            })
            .cloned()
            .collect();
        sort_products(&mut matched, ProductSort::NewestFirst);
        Ok(matched)
    }

    async fn related(
        &self,
        id: ProductId,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.read();
        let Some(anchor) = products.get(&id) else {
            return Ok(Vec::new());
        };

        let mut related: Vec<Product> = products
            .values()
            .filter(|candidate| candidate.id != id)
            .filter(|candidate| {
                candidate.product_type == anchor.product_type
                    || candidate.category == anchor.category
                    || (candidate.attributes.collection.is_some()
                        && candidate.attributes.collection == anchor.attributes.collection)
                    || candidate
                        .categories
                        .iter()
                        .any(|label| anchor.categories.contains(label))
            })
            .cloned()
            .collect();
        sort_products(&mut related, ProductSort::NewestFirst);
        related.truncate(limit);
        Ok(related)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use oakline_core::{CurrencyCode, GuestToken, Price};

    use crate::models::{Designer, ProductCategory, ProductType};

    fn product(name: &str, amount: i64) -> Product {
        Product {
            id: ProductId::random(),
            sku: format!("SKU-{name}"),
            name: name.to_string(),
            description: None,
            product_type: ProductType::Wardrobe,
            category: ProductCategory::SlidingWardrobe,
            price: Price::new(Decimal::new(amount, 0), CurrencyCode::INR),
            inventory: crate::models::Inventory {
                quantity: 4,
                reserved: 0,
            },
            categories: vec![],
            attributes: crate::models::ProductAttributes::default(),
            designer: Designer {
                name: "S. Rao".to_string(),
                area: "Bengaluru".to_string(),
            },
            images: vec![],
            tags: vec![],
            features: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fetch_or_create_is_lazy_and_stable() {
        let store = InMemoryCartStore::new();
        let owner = OwnerId::Guest(GuestToken::random());

        assert!(store.fetch(owner).await.expect("fetch").is_none());

        let first = store.fetch_or_create(owner).await.expect("create");
        let second = store.fetch_or_create(owner).await.expect("reuse");
        assert_eq!(first.owner(), second.owner());
        assert_eq!(first.created_at(), second.created_at());
    }

    #[tokio::test]
    async fn test_delete_removes_record_entirely() {
        let store = InMemoryCartStore::new();
        let owner = OwnerId::Guest(GuestToken::random());
        store.fetch_or_create(owner).await.expect("create");

        store.delete(owner).await.expect("delete");

        assert!(store.fetch(owner).await.expect("fetch").is_none());
    }

    #[tokio::test]
    async fn test_catalog_insert_rejects_duplicate_sku() {
        let store = InMemoryCatalogStore::new();
        let first = product("aria", 100);
        let mut second = product("aria", 200);
        second.sku = first.sku.clone();

        store.insert(&first).await.expect("insert");
        let err = store.insert(&second).await.expect_err("duplicate sku");
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_catalog_list_paginates() {
        let store = InMemoryCatalogStore::new();
        for i in 0..25 {
            store
                .insert(&product(&format!("p{i}"), 100 + i))
                .await
                .expect("insert");
        }

        let page = store
            .list(
                &ProductFilter::default(),
                ProductSort::PriceAsc,
                Pagination { page: 2, limit: 10 },
            )
            .await
            .expect("list");

        assert_eq!(page.total_products, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.products.len(), 10);
        assert_eq!(page.products[0].price.amount, Decimal::new(110, 0));
    }

    #[tokio::test]
    async fn test_catalog_stats() {
        let store = InMemoryCatalogStore::new();
        store.insert(&product("a", 100)).await.expect("insert");
        store.insert(&product("b", 200)).await.expect("insert");

        let stats = store.stats().await.expect("stats");
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.average_price, Decimal::new(150, 0));
        assert_eq!(stats.min_price, Decimal::new(100, 0));
        assert_eq!(stats.max_price, Decimal::new(200, 0));
        assert_eq!(stats.total_inventory, 8);
    }

    #[tokio::test]
    async fn test_find_by_product_scans_all_wishlists() {
        let store = InMemoryWishlistStore::new();
        let product_id = ProductId::random();

        let owner_a = OwnerId::Guest(GuestToken::random());
        let mut wishlist_a = store.fetch_or_create(owner_a).await.expect("create");
        wishlist_a.add(product_id);
        store.save(&wishlist_a).await.expect("save");

        let owner_b = OwnerId::Guest(GuestToken::random());
        store.fetch_or_create(owner_b).await.expect("create");

        let holders = store.find_by_product(product_id).await.expect("find");
        assert_eq!(holders.len(), 1);
        assert_eq!(holders[0].owner(), owner_a);
    }
}
