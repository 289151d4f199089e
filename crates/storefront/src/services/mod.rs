//! Application services for the storefront.
//!
//! - [`token`] - bearer-credential verification port and JWT implementation
//! - [`merge`] - the guest-to-authenticated-owner merge engine
//! - [`catalog`] - catalog reads with TTL caching, admin CRUD, price-change
//!   detection
//! - [`notify`] - price-change notification port

pub mod catalog;
pub mod merge;
pub mod notify;
pub mod token;

pub use catalog::{CatalogService, ProductDraft};
pub use merge::merge_guest_into_user;
pub use notify::{LogNotifier, PriceChangeNotifier};
pub use token::{AuthError, JwtVerifier, StaticTokenVerifier, TokenVerifier};
