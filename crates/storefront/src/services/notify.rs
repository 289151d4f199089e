//! Price-change notification port.
//!
//! When an admin update changes a product's price, owners with that product
//! on their wishlist are told about it. Delivery (email, push, ...) is an
//! external collaborator; the default implementation records a structured
//! event and lets the pipeline downstream of the log handle fan-out.

use async_trait::async_trait;

use oakline_core::{OwnerId, Price};

use crate::models::Product;

/// Receives price-change events for wishlist holders.
#[async_trait]
pub trait PriceChangeNotifier: Send + Sync {
    /// Called after a product's price changed from `previous`.
    async fn price_changed(&self, product: &Product, previous: Price, holders: &[OwnerId]);
}

/// Notifier that records the event as a structured tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl PriceChangeNotifier for LogNotifier {
    async fn price_changed(&self, product: &Product, previous: Price, holders: &[OwnerId]) {
        tracing::info!(
            product_id = %product.id,
            sku = %product.sku,
            previous = %previous,
            current = %product.price,
            holders = holders.len(),
            "product price changed"
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Mutex, PoisonError};

    use super::*;

    /// Notifier that records every event for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        events: Mutex<Vec<RecordedEvent>>,
    }

    #[derive(Debug, Clone)]
    pub struct RecordedEvent {
        pub product_id: oakline_core::ProductId,
        pub previous: Price,
        pub current: Price,
        pub holders: Vec<OwnerId>,
    }

    impl RecordingNotifier {
        pub fn events(&self) -> Vec<RecordedEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl PriceChangeNotifier for RecordingNotifier {
        async fn price_changed(&self, product: &Product, previous: Price, holders: &[OwnerId]) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedEvent {
                    product_id: product.id,
                    previous,
                    current: product.price,
                    holders: holders.to_vec(),
                });
        }
    }
}
