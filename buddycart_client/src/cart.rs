//! Catalog browsing and the caller's active cart.

use log::*;

use crate::{
    data_objects::{Cart, NewCartItem, Product},
    errors::ClientError,
    traits::StorefrontBackend,
};

/// Cart operations.
///
/// Every mutation refetches the cart afterwards and hands the fresh snapshot back, so callers always hold the
/// server's view of prices and line totals rather than a locally patched one.
pub struct CartApi<B> {
    backend: B,
}

impl<B> CartApi<B>
where B: StorefrontBackend + Sync
{
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The product catalog.
    pub async fn products(&self) -> Result<Vec<Product>, ClientError> {
        self.backend.products().await
    }

    /// The active cart. The server creates an empty one on first access, so this never 404s for a signed-in user.
    pub async fn load(&self) -> Result<Cart, ClientError> {
        self.backend.fetch_cart().await
    }

    pub async fn add_item(&self, product_id: &str, quantity: u32) -> Result<Cart, ClientError> {
        validate_quantity(quantity)?;
        let item = NewCartItem { product_id: product_id.to_string(), quantity };
        let line = self.backend.add_cart_item(&item).await?;
        debug!("🛒 Added {} × {} to the cart", line.quantity, line.product.name);
        self.backend.fetch_cart().await
    }

    pub async fn update_quantity(&self, line_id: &str, quantity: u32) -> Result<Cart, ClientError> {
        validate_quantity(quantity)?;
        self.backend.update_cart_quantity(line_id, quantity).await?;
        self.backend.fetch_cart().await
    }

    pub async fn remove_item(&self, line_id: &str) -> Result<Cart, ClientError> {
        self.backend.remove_cart_item(line_id).await?;
        self.backend.fetch_cart().await
    }

    /// Empties the cart and returns the (now empty) snapshot.
    pub async fn clear(&self) -> Result<Cart, ClientError> {
        let cleared = self.backend.clear_cart().await?;
        debug!("🛒 Cleared the cart ({} items removed)", cleared.items_removed);
        self.backend.fetch_cart().await
    }
}

fn validate_quantity(quantity: u32) -> Result<(), ClientError> {
    if quantity < 1 {
        return Err(ClientError::Validation("Quantity must be at least 1".to_string()));
    }
    Ok(())
}
