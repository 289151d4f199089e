//! Core types for Oakline.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod owner;
pub mod price;

pub use id::*;
pub use owner::{OwnerId, OwnerIdError};
pub use price::{CurrencyCode, Price, UnknownCurrency};
