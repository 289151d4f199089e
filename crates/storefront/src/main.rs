//! Oakline Storefront - Public catalog, cart, and wishlist API.
//!
//! This binary serves the storefront API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON request/response bodies
//! - `PostgreSQL` for catalog, cart, and wishlist records
//! - Bearer JWT for authenticated sessions, `x-guest-id` header for
//!   anonymous ones; a login merges the guest cart/wishlist into the
//!   authenticated owner's copy

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oakline_storefront::config::StorefrontConfig;
use oakline_storefront::db::postgres::{PgCartStore, PgCatalogStore, PgWishlistStore};
use oakline_storefront::db::{WishlistStore, create_pool};
use oakline_storefront::routes;
use oakline_storefront::services::{CatalogService, JwtVerifier, LogNotifier};
use oakline_storefront::state::AppState;

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize tracing with EnvFilter
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "oakline_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize database connection pool
    let pool = create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations applied");

    // Wire stores and services
    let wishlists = Arc::new(PgWishlistStore::new(pool.clone()));
    let catalog = CatalogService::new(
        Arc::new(PgCatalogStore::new(pool.clone())),
        Arc::clone(&wishlists) as Arc<dyn WishlistStore>,
        Arc::new(LogNotifier),
    );
    let tokens = Arc::new(JwtVerifier::new(&config.jwt_secret));

    let state = AppState::new(
        config.clone(),
        Arc::new(PgCartStore::new(pool)),
        wishlists,
        catalog,
        tokens,
    );

    // Build router
    let app = routes::app(state);

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
