//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. `TraceLayer` (request tracing)
//! 2. Request ID (add unique ID to each request)
//! 3. Identity resolution (bearer token or guest header, echo guest id)
//! 4. CORS

pub mod identity;
pub mod request_id;

pub use identity::{
    GUEST_ID_HEADER, Identity, RequireGuestHeader, RequireUser, identity_middleware,
};
pub use request_id::request_id_middleware;
