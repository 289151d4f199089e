//! One-time repair for legacy owner-field corruption.
//!
//! A defect in an earlier system persisted a single add-operation payload
//! (`{"productId": .., "quantity": ..}`) as the owner field of a cart or
//! wishlist record. The composite `(owner_id, is_guest)` key now makes new
//! occurrences impossible; this module recognises imported legacy rows so
//! a store can extract the embedded line item, append it to the entries,
//! and rewrite the owner field to the plain identifier - once, on read.

use serde::Deserialize;

use oakline_core::ProductId;

/// The single line item recovered from a corrupted owner field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedAddPayload {
    pub product_id: ProductId,
    /// Requested quantity; 1 when the payload carried none (wishlists).
    pub quantity: u32,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "productId")]
    product_id: String,
    #[serde(default)]
    quantity: Option<serde_json::Value>,
}

/// Detect a corrupted owner field and extract its embedded payload.
///
/// Returns `None` for well-formed owner identifiers and for malformed data
/// that does not match the known defect shape (those surface as
/// data-corruption errors downstream instead of being silently dropped).
#[must_use]
pub fn extract_embedded_payload(raw_owner: &str) -> Option<EmbeddedAddPayload> {
    if !raw_owner.trim_start().starts_with('{') {
        return None;
    }

    let payload: RawPayload = serde_json::from_str(raw_owner).ok()?;
    let product_id: ProductId = payload.product_id.parse().ok()?;

    let quantity = match payload.quantity {
        None => 1,
        Some(value) => parse_quantity(&value)?,
    };

    Some(EmbeddedAddPayload {
        product_id,
        quantity,
    })
}

/// The legacy writer stored quantity as either a number or a numeric
/// string; both forms occur in the wild.
fn parse_quantity(value: &serde_json::Value) -> Option<u32> {
    let quantity = match value {
        serde_json::Value::Number(n) => u32::try_from(n.as_u64()?).ok()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (quantity > 0).then_some(quantity)
}
