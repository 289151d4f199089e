//! Product route handlers.
//!
//! The listing accepts the storefront's filter vocabulary as query
//! parameters; comma-separated values express multi-select filters.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use oakline_core::ProductId;

use crate::db::{
    CatalogStats, CollectionSummary, FilterOptions, Pagination, ProductFilter, ProductSort,
};
use crate::error::{AppError, Result};
use crate::models::{Product, ProductCategory, ProductType};
use crate::services::ProductDraft;
use crate::state::AppState;

/// Product listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    pub search: Option<String>,
    /// Comma-separated product types.
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    /// Comma-separated product categories.
    pub category: Option<String>,
    pub collection: Option<String>,
    /// Comma-separated colour families.
    pub color: Option<String>,
    pub material: Option<String>,
    /// Comma-separated configurations.
    pub configuration: Option<String>,
    pub designer: Option<String>,
    pub tag: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductListQuery {
    /// Translate the raw query into a typed filter.
    ///
    /// # Errors
    ///
    /// Returns a validation failure for unknown type or category labels.
    fn to_filter(&self) -> Result<ProductFilter> {
        let product_types = parse_csv(self.product_type.as_deref(), |label| {
            label
                .parse::<ProductType>()
                .map_err(|err| AppError::Validation(err.to_string()))
        })?;
        let categories = parse_csv(self.category.as_deref(), |label| {
            label
                .parse::<ProductCategory>()
                .map_err(|err| AppError::Validation(err.to_string()))
        })?;

        Ok(ProductFilter {
            search: self.search.clone(),
            product_types,
            categories,
            collection: self.collection.clone(),
            color_families: parse_csv(self.color.as_deref(), |s| Ok(s.to_string()))?,
            material: self.material.clone(),
            configurations: parse_csv(self.configuration.as_deref(), |s| Ok(s.to_string()))?,
            designer: self.designer.clone(),
            tag: self.tag.clone(),
            min_price: self.min_price,
            max_price: self.max_price,
        })
    }
}

/// Split a comma-separated parameter, mapping each non-empty element.
fn parse_csv<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<Vec<T>> {
    raw.map_or_else(
        || Ok(Vec::new()),
        |raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(parse)
                .collect()
        },
    )
}

/// Product listing response body.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: u64,
    pub limit: u32,
}

/// Bulk-insert response body.
#[derive(Debug, Serialize)]
pub struct BulkInsertResponse {
    pub inserted: u64,
}

/// Collection listing response body.
#[derive(Debug, Serialize)]
pub struct CollectionProductsResponse {
    pub products: Vec<Product>,
}

/// Filtered, paginated product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>> {
    let filter = query.to_filter()?;
    let sort = query
        .sort
        .as_deref()
        .map_or_else(ProductSort::default, ProductSort::parse);
    let page = Pagination::clamped(query.page, query.limit);

    let listing = state.catalog().list(&filter, sort, page).await?;

    Ok(Json(ProductListResponse {
        products: listing.products.clone(),
        current_page: listing.current_page,
        total_pages: listing.total_pages,
        total_products: listing.total_products,
        limit: listing.limit,
    }))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get(id).await?))
}

/// Up to five related products.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.catalog().related(id).await?))
}

/// Aggregate catalog statistics.
#[instrument(skip(state))]
pub async fn stats(State(state): State<AppState>) -> Result<Json<CatalogStats>> {
    Ok(Json(state.catalog().stats().await?))
}

/// Distinct values for the filterable attributes.
#[instrument(skip(state))]
pub async fn filter_options(State(state): State<AppState>) -> Result<Json<FilterOptions>> {
    Ok(Json(state.catalog().filter_options().await?))
}

/// Distinct collections with representative images.
#[instrument(skip(state))]
pub async fn collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionSummary>>> {
    let collections = state.catalog().collections().await?;
    Ok(Json(collections.as_ref().clone()))
}

/// Products in a collection (case-insensitive).
#[instrument(skip(state))]
pub async fn collection_products(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CollectionProductsResponse>> {
    let products = state.catalog().by_collection(&name).await?;
    Ok(Json(CollectionProductsResponse { products }))
}

/// Create a product.
#[instrument(skip(state, draft))]
pub async fn create(
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog().create(draft).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Bulk-insert products.
#[instrument(skip(state, drafts))]
pub async fn bulk(
    State(state): State<AppState>,
    Json(drafts): Json<Vec<ProductDraft>>,
) -> Result<(StatusCode, Json<BulkInsertResponse>)> {
    let inserted = state.catalog().bulk_insert(drafts).await?;
    Ok((StatusCode::CREATED, Json(BulkInsertResponse { inserted })))
}

/// Replace a product. A price change notifies wishlist holders.
#[instrument(skip(state, draft))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().update(id, draft).await?))
}

/// Delete a product.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    state.catalog().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
