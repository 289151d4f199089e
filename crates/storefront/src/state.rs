//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::{CollectionStore, WishlistStore};
use crate::models::Cart;
use crate::services::{CatalogService, TokenVerifier};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// injected stores and services. Nothing reaches persistence except
/// through these interfaces, which is what lets the test suites swap in
/// the in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    carts: Arc<dyn CollectionStore<Cart>>,
    wishlists: Arc<dyn WishlistStore>,
    catalog: CatalogService,
    tokens: Arc<dyn TokenVerifier>,
}

impl AppState {
    /// Create application state from injected components.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        carts: Arc<dyn CollectionStore<Cart>>,
        wishlists: Arc<dyn WishlistStore>,
        catalog: CatalogService,
        tokens: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                carts,
                wishlists,
                catalog,
                tokens,
            }),
        }
    }

    /// State wired against the in-memory stores.
    ///
    /// Used by the test suites and local development without a database.
    #[must_use]
    pub fn in_memory(config: StorefrontConfig, tokens: Arc<dyn TokenVerifier>) -> Self {
        use crate::db::memory::{InMemoryCartStore, InMemoryCatalogStore, InMemoryWishlistStore};
        use crate::services::LogNotifier;

        let wishlists = Arc::new(InMemoryWishlistStore::new());
        let catalog = CatalogService::new(
            Arc::new(InMemoryCatalogStore::new()),
            Arc::clone(&wishlists) as Arc<dyn WishlistStore>,
            Arc::new(LogNotifier),
        );

        Self::new(
            config,
            Arc::new(InMemoryCartStore::new()),
            wishlists,
            catalog,
            tokens,
        )
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn carts(&self) -> &dyn CollectionStore<Cart> {
        self.inner.carts.as_ref()
    }

    /// Get a reference to the wishlist store.
    #[must_use]
    pub fn wishlists(&self) -> &dyn WishlistStore {
        self.inner.wishlists.as_ref()
    }

    /// Get a reference to the catalog service.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// Get a reference to the token verifier.
    #[must_use]
    pub fn tokens(&self) -> &dyn TokenVerifier {
        self.inner.tokens.as_ref()
    }
}
