//! Catalog product model.
//!
//! Oakline sells configurable wardrobes and storage units; the attribute
//! block mirrors what the configurator exposes as filters (collection,
//! colour family, carcass dimensions, door count, finish).

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use oakline_core::{Price, ProductId};

/// Error for parsing a stored enum label.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown label: {0}")]
pub struct UnknownLabel(pub String);

/// Top-level product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    Wardrobe,
    Storage,
}

impl ProductType {
    /// The catalog-facing label, identical to the serialized form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Wardrobe => "Wardrobe",
            Self::Storage => "Storage",
        }
    }
}

impl FromStr for ProductType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Wardrobe" => Ok(Self::Wardrobe),
            "Storage" => Ok(Self::Storage),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Catalog category within a product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Sliding Wardrobe")]
    SlidingWardrobe,
    #[serde(rename = "Openable Wardrobe")]
    OpenableWardrobe,
    #[serde(rename = "Sliding Storage")]
    SlidingStorage,
    #[serde(rename = "Openable Storage")]
    OpenableStorage,
}

impl ProductCategory {
    /// The catalog-facing label, identical to the serialized form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SlidingWardrobe => "Sliding Wardrobe",
            Self::OpenableWardrobe => "Openable Wardrobe",
            Self::SlidingStorage => "Sliding Storage",
            Self::OpenableStorage => "Openable Storage",
        }
    }
}

impl FromStr for ProductCategory {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sliding Wardrobe" => Ok(Self::SlidingWardrobe),
            "Openable Wardrobe" => Ok(Self::OpenableWardrobe),
            "Sliding Storage" => Ok(Self::SlidingStorage),
            "Openable Storage" => Ok(Self::OpenableStorage),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

/// Stock levels for a product.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub quantity: i32,
    pub reserved: i32,
}

/// Colour attribute: family drives filtering, shade is display-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorAttribute {
    pub family: String,
    pub shade: Option<String>,
}

/// Carcass dimensions in millimetres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

/// Configurator-facing attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub collection: Option<String>,
    pub material: Option<String>,
    pub color: Option<ColorAttribute>,
    pub dimensions: Option<Dimensions>,
    pub doors: Option<u8>,
    pub configuration: Option<String>,
    pub finish: Option<String>,
}

/// Designer attribution (royalty accounting happens elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Designer {
    pub name: String,
    pub area: String,
}

/// Product image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub product_type: ProductType,
    pub category: ProductCategory,
    pub price: Price,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub attributes: ProductAttributes,
    pub designer: Designer,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The primary image, falling back to the first one.
    #[must_use]
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
    }

    /// Compact representation used when populating cart/wishlist entries.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            sku: self.sku.clone(),
            name: self.name.clone(),
            price: self.price,
            image: self.primary_image().map(|img| img.url.clone()),
        }
    }
}

/// Compact product view embedded in cart and wishlist responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub price: Price,
    pub image: Option<String>,
}
