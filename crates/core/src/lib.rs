//! Oakline Core - Shared types library.
//!
//! This crate provides common types used across all Oakline components:
//! - `storefront` - The public catalog / cart / wishlist API
//! - `integration-tests` - End-to-end test harness
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and owner identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
