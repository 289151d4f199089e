//! `PostgreSQL` store implementations.
//!
//! Queries are runtime-checked (`sqlx::query` / `query_as`), so the crate
//! builds without a live database. Collections are keyed by the composite
//! `(owner_id, is_guest)` primary key; first-access creation goes through
//! `INSERT .. ON CONFLICT DO NOTHING` followed by a re-read, which is the
//! store-level atomic insert-if-absent the contract requires.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use oakline_core::{CurrencyCode, OwnerId, Price, ProductId};

use crate::models::{
    Cart, CartEntry, Designer, Product, ProductAttributes, ProductImage, Wishlist,
};

use super::repair::extract_embedded_payload;
use super::{
    CatalogStats, CatalogStore, CollectionStore, CollectionSummary, FilterOptions, Pagination,
    ProductFilter, ProductPage, ProductSort, RepositoryError, WishlistStore,
};

const RELATED_LIMIT_CAP: i64 = 25;

fn corrupt(what: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(what.to_string())
}

// =============================================================================
// Carts
// =============================================================================

/// Cart store backed by the `carts` table.
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Decode a fetched row into a [`Cart`].
    ///
    /// Applies the legacy owner-field repair: a row whose owner column
    /// holds an embedded add-payload gets the payload extracted into an
    /// entry (at a zero captured price), the owner rewritten to the
    /// requested identifier, and the repaired record persisted once.
    async fn decode_row(
        &self,
        owner: OwnerId,
        row: &sqlx::postgres::PgRow,
    ) -> Result<Cart, RepositoryError> {
        let raw_owner: String = row.try_get("owner_id")?;
        let entries_json: serde_json::Value = row.try_get("entries")?;
        let discount: Decimal = row.try_get("discount")?;
        let currency: String = row.try_get("currency")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        let mut entries: Vec<CartEntry> =
            serde_json::from_value(entries_json).map_err(corrupt)?;
        let currency: CurrencyCode = currency.parse().map_err(corrupt)?;

        let needs_repair = if raw_owner == owner.to_string() {
            false
        } else if let Some(payload) = extract_embedded_payload(&raw_owner) {
            // Unit price unknown at repair time; totals recompute from
            // entries so the line contributes nothing until re-added.
            entries.push(CartEntry {
                product_id: payload.product_id,
                quantity: payload.quantity,
                unit_price: Price::zero(currency),
            });
            tracing::warn!(owner = %owner, "repaired legacy cart owner field");
            true
        } else {
            return Err(corrupt(format!("unexpected cart owner field: {raw_owner}")));
        };

        let cart = Cart::from_parts(owner, entries, discount, currency, created_at, updated_at);
        if needs_repair {
            self.save(&cart).await?;
        }
        Ok(cart)
    }
}

#[async_trait]
impl CollectionStore<Cart> for PgCartStore {
    async fn fetch(&self, owner: OwnerId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query(
            "SELECT owner_id, entries, discount, currency, created_at, updated_at \
             FROM carts WHERE owner_id = $1 AND is_guest = $2",
        )
        .bind(owner.to_string())
        .bind(owner.is_guest())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.decode_row(owner, &row).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_or_create(&self, owner: OwnerId) -> Result<Cart, RepositoryError> {
        sqlx::query(
            "INSERT INTO carts (owner_id, is_guest) VALUES ($1, $2) \
             ON CONFLICT (owner_id, is_guest) DO NOTHING",
        )
        .bind(owner.to_string())
        .bind(owner.is_guest())
        .execute(&self.pool)
        .await?;

        self.fetch(owner).await?.ok_or_else(|| {
            RepositoryError::Conflict(format!("cart for {owner} vanished after upsert"))
        })
    }

    async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let entries = serde_json::to_value(cart.entries()).map_err(corrupt)?;

        sqlx::query(
            "INSERT INTO carts (owner_id, is_guest, entries, discount, currency, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (owner_id, is_guest) DO UPDATE \
             SET entries = EXCLUDED.entries, discount = EXCLUDED.discount, \
                 currency = EXCLUDED.currency, updated_at = EXCLUDED.updated_at",
        )
        .bind(cart.owner().to_string())
        .bind(cart.owner().is_guest())
        .bind(entries)
        .bind(cart.discount())
        .bind(cart.currency().as_str())
        .bind(cart.created_at())
        .bind(cart.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, owner: OwnerId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE owner_id = $1 AND is_guest = $2")
            .bind(owner.to_string())
            .bind(owner.is_guest())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Wishlists
// =============================================================================

/// Wishlist store backed by the `wishlists` table.
#[derive(Debug, Clone)]
pub struct PgWishlistStore {
    pool: PgPool,
}

impl PgWishlistStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn decode_row(
        &self,
        owner: OwnerId,
        row: &sqlx::postgres::PgRow,
    ) -> Result<Wishlist, RepositoryError> {
        let raw_owner: String = row.try_get("owner_id")?;
        let product_ids: Vec<Uuid> = row.try_get("products")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        let mut products: Vec<ProductId> =
            product_ids.into_iter().map(ProductId::new).collect();

        let needs_repair = if raw_owner == owner.to_string() {
            false
        } else if let Some(payload) = extract_embedded_payload(&raw_owner) {
            products.push(payload.product_id);
            tracing::warn!(owner = %owner, "repaired legacy wishlist owner field");
            true
        } else {
            return Err(corrupt(format!(
                "unexpected wishlist owner field: {raw_owner}"
            )));
        };

        let wishlist = Wishlist::from_parts(owner, products, created_at, updated_at);
        if needs_repair {
            self.save(&wishlist).await?;
        }
        Ok(wishlist)
    }

    fn decode_unkeyed_row(row: &sqlx::postgres::PgRow) -> Result<Wishlist, RepositoryError> {
        let raw_owner: String = row.try_get("owner_id")?;
        let is_guest: bool = row.try_get("is_guest")?;
        let product_ids: Vec<Uuid> = row.try_get("products")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        let owner = OwnerId::from_parts(&raw_owner, is_guest).map_err(corrupt)?;
        Ok(Wishlist::from_parts(
            owner,
            product_ids.into_iter().map(ProductId::new).collect(),
            created_at,
            updated_at,
        ))
    }
}

#[async_trait]
impl CollectionStore<Wishlist> for PgWishlistStore {
    async fn fetch(&self, owner: OwnerId) -> Result<Option<Wishlist>, RepositoryError> {
        let row = sqlx::query(
            "SELECT owner_id, products, created_at, updated_at \
             FROM wishlists WHERE owner_id = $1 AND is_guest = $2",
        )
        .bind(owner.to_string())
        .bind(owner.is_guest())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.decode_row(owner, &row).await?)),
            None => Ok(None),
        }
    }

    async fn fetch_or_create(&self, owner: OwnerId) -> Result<Wishlist, RepositoryError> {
        sqlx::query(
            "INSERT INTO wishlists (owner_id, is_guest) VALUES ($1, $2) \
             ON CONFLICT (owner_id, is_guest) DO NOTHING",
        )
        .bind(owner.to_string())
        .bind(owner.is_guest())
        .execute(&self.pool)
        .await?;

        self.fetch(owner).await?.ok_or_else(|| {
            RepositoryError::Conflict(format!("wishlist for {owner} vanished after upsert"))
        })
    }

    async fn save(&self, wishlist: &Wishlist) -> Result<(), RepositoryError> {
        let products: Vec<Uuid> = wishlist
            .products()
            .iter()
            .map(|id| id.as_uuid())
            .collect();

        sqlx::query(
            "INSERT INTO wishlists (owner_id, is_guest, products, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (owner_id, is_guest) DO UPDATE \
             SET products = EXCLUDED.products, updated_at = EXCLUDED.updated_at",
        )
        .bind(wishlist.owner().to_string())
        .bind(wishlist.owner().is_guest())
        .bind(products)
        .bind(wishlist.created_at())
        .bind(wishlist.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, owner: OwnerId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM wishlists WHERE owner_id = $1 AND is_guest = $2")
            .bind(owner.to_string())
            .bind(owner.is_guest())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WishlistStore for PgWishlistStore {
    async fn find_by_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Wishlist>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT owner_id, is_guest, products, created_at, updated_at \
             FROM wishlists WHERE $1 = ANY(products)",
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode_unkeyed_row).collect()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog store backed by the `products` table.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode_product(row: &sqlx::postgres::PgRow) -> Result<Product, RepositoryError> {
        let product_type: String = row.try_get("product_type")?;
        let category: String = row.try_get("category")?;
        let price_amount: Decimal = row.try_get("price_amount")?;
        let price_currency: String = row.try_get("price_currency")?;
        let attributes: serde_json::Value = row.try_get("attributes")?;
        let designer: serde_json::Value = row.try_get("designer")?;
        let images: serde_json::Value = row.try_get("images")?;

        let attributes: ProductAttributes =
            serde_json::from_value(attributes).map_err(corrupt)?;
        let designer: Designer = serde_json::from_value(designer).map_err(corrupt)?;
        let images: Vec<ProductImage> = serde_json::from_value(images).map_err(corrupt)?;

        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            product_type: product_type.parse().map_err(corrupt)?,
            category: category.parse().map_err(corrupt)?,
            price: Price::new(price_amount, price_currency.parse().map_err(corrupt)?),
            inventory: crate::models::Inventory {
                quantity: row.try_get("inventory_quantity")?,
                reserved: row.try_get("inventory_reserved")?,
            },
            categories: row.try_get("categories")?,
            attributes,
            designer,
            images,
            tags: row.try_get("tags")?,
            features: row.try_get("features")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Append the filter predicate to a query that already ends in `WHERE`
    /// clauses joined by `AND TRUE`-style continuation.
    fn push_filter<'a>(qb: &mut QueryBuilder<'a, sqlx::Postgres>, filter: &'a ProductFilter) {
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR sku ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR attributes->>'collection' ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE ");
            qb.push_bind(pattern);
            qb.push("))");
        }

        if !filter.product_types.is_empty() {
            let labels: Vec<String> = filter
                .product_types
                .iter()
                .map(|t| t.as_str().to_string())
                .collect();
            qb.push(" AND product_type = ANY(");
            qb.push_bind(labels);
            qb.push(")");
        }

        if !filter.categories.is_empty() {
            let labels: Vec<String> = filter
                .categories
                .iter()
                .map(|c| c.as_str().to_string())
                .collect();
            qb.push(" AND category = ANY(");
            qb.push_bind(labels);
            qb.push(")");
        }

        if let Some(collection) = &filter.collection {
            qb.push(" AND attributes->>'collection' ILIKE ");
            qb.push_bind(collection.clone());
        }

        if !filter.color_families.is_empty() {
            qb.push(" AND attributes->'color'->>'family' = ANY(");
            qb.push_bind(filter.color_families.clone());
            qb.push(")");
        }

        if let Some(material) = &filter.material {
            qb.push(" AND attributes->>'material' ILIKE ");
            qb.push_bind(format!("%{material}%"));
        }

        if !filter.configurations.is_empty() {
            qb.push(" AND attributes->>'configuration' = ANY(");
            qb.push_bind(filter.configurations.clone());
            qb.push(")");
        }

        if let Some(designer) = &filter.designer {
            qb.push(" AND designer->>'name' ILIKE ");
            qb.push_bind(format!("%{designer}%"));
        }

        if let Some(tag) = &filter.tag {
            qb.push(" AND EXISTS (SELECT 1 FROM unnest(tags) t WHERE t ILIKE ");
            qb.push_bind(format!("%{tag}%"));
            qb.push(")");
        }

        if let Some(min) = filter.min_price {
            qb.push(" AND price_amount >= ");
            qb.push_bind(min);
        }

        if let Some(max) = filter.max_price {
            qb.push(" AND price_amount <= ");
            qb.push_bind(max);
        }
    }

    const fn order_clause(sort: ProductSort) -> &'static str {
        match sort {
            ProductSort::NewestFirst => " ORDER BY created_at DESC",
            ProductSort::OldestFirst => " ORDER BY created_at ASC",
            ProductSort::PriceAsc => " ORDER BY price_amount ASC",
            ProductSort::PriceDesc => " ORDER BY price_amount DESC",
            ProductSort::NameAsc => " ORDER BY name ASC",
        }
    }

    async fn distinct_text(&self, sql: &str) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(RepositoryError::from))
            .collect()
    }
}

const PRODUCT_COLUMNS: &str = "id, sku, name, description, product_type, category, \
     price_amount, price_currency, inventory_quantity, inventory_reserved, categories, \
     attributes, designer, images, tags, features, created_at, updated_at";

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Pagination,
    ) -> Result<ProductPage, RepositoryError> {
        let mut count_qb =
            QueryBuilder::new("SELECT COUNT(*) FROM products WHERE TRUE");
        Self::push_filter(&mut count_qb, filter);
        let total_products: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        let total_products = u64::try_from(total_products).unwrap_or(0);

        let mut qb = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"
        ));
        Self::push_filter(&mut qb, filter);
        qb.push(Self::order_clause(sort));
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(page.limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));

        let rows = qb.build().fetch_all(&self.pool).await?;
        let products = rows
            .iter()
            .map(Self::decode_product)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductPage {
            products,
            current_page: page.page,
            total_pages: u32::try_from(total_products.div_ceil(u64::from(page.limit)))
                .unwrap_or(u32::MAX),
            total_products,
            limit: page.limit,
        })
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::decode_product).transpose()
    }

    async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        let attributes = serde_json::to_value(&product.attributes).map_err(corrupt)?;
        let designer = serde_json::to_value(&product.designer).map_err(corrupt)?;
        let images = serde_json::to_value(&product.images).map_err(corrupt)?;

        let result = sqlx::query(
            "INSERT INTO products (id, sku, name, description, product_type, category, \
             price_amount, price_currency, inventory_quantity, inventory_reserved, categories, \
             attributes, designer, images, tags, features, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             ON CONFLICT DO NOTHING",
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.product_type.as_str())
        .bind(product.category.as_str())
        .bind(product.price.amount)
        .bind(product.price.currency.as_str())
        .bind(product.inventory.quantity)
        .bind(product.inventory.reserved)
        .bind(&product.categories)
        .bind(attributes)
        .bind(designer)
        .bind(images)
        .bind(&product.tags)
        .bind(&product.features)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "product with sku {} already exists",
                product.sku
            )));
        }
        Ok(())
    }

    async fn insert_many(&self, batch: &[Product]) -> Result<u64, RepositoryError> {
        let mut written = 0;
        for product in batch {
            self.insert(product).await?;
            written += 1;
        }
        Ok(written)
    }

    async fn update(&self, product: &Product) -> Result<bool, RepositoryError> {
        let attributes = serde_json::to_value(&product.attributes).map_err(corrupt)?;
        let designer = serde_json::to_value(&product.designer).map_err(corrupt)?;
        let images = serde_json::to_value(&product.images).map_err(corrupt)?;

        let result = sqlx::query(
            "UPDATE products SET sku = $2, name = $3, description = $4, product_type = $5, \
             category = $6, price_amount = $7, price_currency = $8, inventory_quantity = $9, \
             inventory_reserved = $10, categories = $11, attributes = $12, designer = $13, \
             images = $14, tags = $15, features = $16, updated_at = $17 \
             WHERE id = $1",
        )
        .bind(product.id.as_uuid())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.product_type.as_str())
        .bind(product.category.as_str())
        .bind(product.price.amount)
        .bind(product.price.currency.as_str())
        .bind(product.inventory.quantity)
        .bind(product.inventory.reserved)
        .bind(&product.categories)
        .bind(attributes)
        .bind(designer)
        .bind(images)
        .bind(&product.tags)
        .bind(&product.features)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<CatalogStats, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS total_products, \
                    COALESCE(ROUND(AVG(price_amount), 2), 0) AS average_price, \
                    COALESCE(MIN(price_amount), 0) AS min_price, \
                    COALESCE(MAX(price_amount), 0) AS max_price, \
                    COALESCE(SUM(inventory_quantity), 0)::BIGINT AS total_inventory \
             FROM products",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CatalogStats {
            total_products: u64::try_from(row.try_get::<i64, _>("total_products")?)
                .unwrap_or(0),
            average_price: row.try_get("average_price")?,
            min_price: row.try_get("min_price")?,
            max_price: row.try_get("max_price")?,
            total_inventory: row.try_get("total_inventory")?,
        })
    }

    async fn filter_options(&self) -> Result<FilterOptions, RepositoryError> {
        let door_rows = sqlx::query(
            "SELECT DISTINCT (attributes->>'doors')::INT AS doors FROM products \
             WHERE attributes->>'doors' IS NOT NULL ORDER BY doors",
        )
        .fetch_all(&self.pool)
        .await?;
        let door_counts = door_rows
            .iter()
            .map(|row| {
                let doors: i32 = row.try_get("doors")?;
                Ok(u8::try_from(doors).unwrap_or(0))
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(FilterOptions {
            types: self
                .distinct_text("SELECT DISTINCT product_type FROM products ORDER BY 1")
                .await?,
            categories: self
                .distinct_text("SELECT DISTINCT category FROM products ORDER BY 1")
                .await?,
            collections: self
                .distinct_text(
                    "SELECT DISTINCT attributes->>'collection' FROM products \
                     WHERE attributes->>'collection' IS NOT NULL ORDER BY 1",
                )
                .await?,
            configurations: self
                .distinct_text(
                    "SELECT DISTINCT attributes->>'configuration' FROM products \
                     WHERE attributes->>'configuration' IS NOT NULL ORDER BY 1",
                )
                .await?,
            color_families: self
                .distinct_text(
                    "SELECT DISTINCT attributes->'color'->>'family' FROM products \
                     WHERE attributes->'color'->>'family' IS NOT NULL ORDER BY 1",
                )
                .await?,
            materials: self
                .distinct_text(
                    "SELECT DISTINCT attributes->>'material' FROM products \
                     WHERE attributes->>'material' IS NOT NULL ORDER BY 1",
                )
                .await?,
            finishes: self
                .distinct_text(
                    "SELECT DISTINCT attributes->>'finish' FROM products \
                     WHERE attributes->>'finish' IS NOT NULL ORDER BY 1",
                )
                .await?,
            door_counts,
        })
    }

    async fn collections(&self) -> Result<Vec<CollectionSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT DISTINCT ON (attributes->>'collection') \
                    attributes->>'collection' AS name, \
                    images->0->>'url' AS image \
             FROM products WHERE attributes->>'collection' IS NOT NULL \
             ORDER BY attributes->>'collection'",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CollectionSummary {
                    name: row.try_get("name")?,
                    image: row.try_get("image")?,
                })
            })
            .collect()
    }

    async fn by_collection(&self, name: &str) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE attributes->>'collection' ILIKE $1 ORDER BY created_at DESC"
        ))
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode_product).collect()
    }

    async fn related(
        &self,
        id: ProductId,
        limit: usize,
    ) -> Result<Vec<Product>, RepositoryError> {
        let limit = i64::try_from(limit)
            .unwrap_or(RELATED_LIMIT_CAP)
            .min(RELATED_LIMIT_CAP);

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p \
             WHERE p.id <> $1 AND EXISTS (\
                 SELECT 1 FROM products anchor WHERE anchor.id = $1 AND (\
                     p.product_type = anchor.product_type \
                     OR p.category = anchor.category \
                     OR (p.attributes->>'collection' IS NOT NULL \
                         AND p.attributes->>'collection' = anchor.attributes->>'collection') \
                     OR p.categories && anchor.categories)) \
             ORDER BY p.created_at DESC LIMIT $2"
        ))
        .bind(id.as_uuid())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode_product).collect()
    }
}
