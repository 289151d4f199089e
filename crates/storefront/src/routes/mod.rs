//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Liveness check
//! GET    /health/ready                        - Readiness check
//!
//! # Products
//! GET    /api/products                        - Filtered, paginated listing
//! GET    /api/products/stats                  - Catalog statistics
//! GET    /api/products/filter-options         - Distinct filterable values
//! GET    /api/products/collections            - Collections with images
//! GET    /api/products/collections/{name}     - Products in a collection
//! GET    /api/products/{id}                   - Product detail
//! GET    /api/products/{id}/related           - Related products
//! POST   /api/products                        - Create product (admin)
//! POST   /api/products/bulk                   - Bulk insert (admin)
//! PUT    /api/products/{id}                   - Update product (admin)
//! DELETE /api/products/{id}                   - Delete product (admin)
//!
//! # Cart
//! GET    /api/cart                            - Caller's cart, populated
//! POST   /api/cart/add                        - Add item
//! POST   /api/cart/remove                     - Remove item (authenticated)
//! PUT    /api/cart/update                     - Set quantity (authenticated)
//! POST   /api/cart/apply-discount             - Apply discount (authenticated)
//! POST   /api/cart/clear                      - Clear cart
//! POST   /api/cart/merge                      - Merge guest cart (authenticated)
//!
//! # Wishlist
//! GET    /api/wishlist                        - Caller's wishlist, populated
//! POST   /api/wishlist/add                    - Add product
//! DELETE /api/wishlist/remove/{product_id}    - Remove product
//! POST   /api/wishlist/clear                  - Clear wishlist
//! POST   /api/wishlist/merge                  - Merge guest wishlist (authenticated)
//! ```
//!
//! Anonymous callers are identified by the `x-guest-id` header; see
//! [`crate::middleware::identity`].

pub mod cart;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{identity_middleware, request_id_middleware};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/bulk", post(products::bulk))
        .route("/stats", get(products::stats))
        .route("/filter-options", get(products::filter_options))
        .route("/collections", get(products::collections))
        .route("/collections/{name}", get(products::collection_products))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::remove),
        )
        .route("/{id}/related", get(products::related))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/update", put(cart::update))
        .route("/apply-discount", post(cart::apply_discount))
        .route("/clear", post(cart::clear))
        .route("/merge", post(cart::merge))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove/{product_id}", delete(wishlist::remove))
        .route("/clear", post(wishlist::clear))
        .route("/merge", post(wishlist::merge))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
}

/// Assemble the full application: routes, middleware, health endpoints.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the catalog store answers before returning OK.
/// Returns 503 Service Unavailable otherwise.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.catalog().stats().await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
