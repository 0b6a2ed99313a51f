//! The shared clubbed order produced by a successful match.

use log::*;

use crate::{
    data_objects::{ClubbedCart, ClubbedOrderId, NewCartItem},
    errors::ClientError,
    state::{ClubMarker, StateStore},
    traits::StorefrontBackend,
};

/// Read and extend the merged clubbed cart.
///
/// Everything that comes back has already been through [`ClubbedCart::without_foreign_lines`]: buddies appear as
/// opaque labels with aggregate totals, and their individual lines are gone. Group totals are whatever the server
/// said they were; nothing is recomputed locally from the redacted view.
pub struct ClubbedOrderApi<B> {
    backend: B,
    store: StateStore,
}

impl<B> ClubbedOrderApi<B>
where B: StorefrontBackend + Sync
{
    pub fn new(backend: B, store: StateStore) -> Self {
        Self { backend, store }
    }

    /// The clubbed order recorded by the last match, if any. Local only.
    pub fn current_club(&self) -> Result<Option<ClubMarker>, ClientError> {
        self.store.club_marker()
    }

    /// Fetches the redacted clubbed cart. When the server no longer knows the order (cancelled, or the marker is
    /// stale), the club marker is cleared before the not-found error is passed on, so the client does not keep
    /// steering the user at a dead order.
    pub async fn fetch(&self, id: &ClubbedOrderId) -> Result<ClubbedCart, ClientError> {
        match self.backend.fetch_clubbed_cart(id).await {
            Ok(cart) => Ok(cart.without_foreign_lines()),
            Err(e) if e.is_not_found() => {
                debug!("Clubbed order {id} is gone. Clearing the club marker");
                self.store.clear_club_marker()?;
                Err(e)
            },
            Err(e) => Err(e),
        }
    }

    /// Adds an item to the caller's share of the clubbed order and returns the refreshed (redacted) view.
    pub async fn add_item(&self, id: &ClubbedOrderId, product_id: &str, quantity: u32) -> Result<ClubbedCart, ClientError> {
        if quantity < 1 {
            return Err(ClientError::Validation("Quantity must be at least 1".to_string()));
        }
        let item = NewCartItem { product_id: product_id.to_string(), quantity };
        let line = self.backend.add_clubbed_item(id, &item).await?;
        debug!("🛒 Added {} × {} to clubbed order {id}", line.quantity, line.product_name);
        self.fetch(id).await
    }
}
