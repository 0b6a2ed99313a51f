use buddycart_common::{Grams, Rupee};

use super::{
    helpers::{cart_490, cart_line, empty_cart},
    mocks::MockBackend,
};
use crate::{cart::CartApi, data_objects::CartCleared, errors::ClientError};

#[tokio::test]
async fn add_item_returns_the_servers_fresh_snapshot() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_add_cart_item()
        .times(1)
        .withf(|item| item.product_id == "p-a" && item.quantity == 2)
        .returning(|_| Ok(cart_line("a", 2, Rupee::from_rupees(120), Grams::from(500))));
    backend.expect_fetch_cart().times(1).returning(|| Ok(cart_490()));

    let api = CartApi::new(backend);
    let cart = api.add_item("p-a", 2).await.expect("Adding to the cart failed");
    assert_eq!(cart.total(), Rupee::from_rupees(490));
    assert_eq!(cart.item_count(), 3);
}

#[tokio::test]
async fn zero_quantity_is_rejected_before_the_wire() {
    let _ = env_logger::try_init().ok();
    // No expectations: any backend call would fail the test.
    let api = CartApi::new(MockBackend::new());
    let err = api.add_item("p-a", 0).await.expect_err("Expected a validation error");
    assert!(matches!(err, ClientError::Validation(_)));
    let err = api.update_quantity("line-1", 0).await.expect_err("Expected a validation error");
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn update_and_remove_refetch_the_cart() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_update_cart_quantity().times(1).withf(|id, qty| id == "line-1" && *qty == 3).returning(|_, _| Ok(()));
    backend.expect_remove_cart_item().times(1).withf(|id| id == "line-2").returning(|_| Ok(()));
    backend.expect_fetch_cart().times(2).returning(|| Ok(cart_490()));

    let api = CartApi::new(backend);
    api.update_quantity("line-1", 3).await.expect("Update failed");
    let cart = api.remove_item("line-2").await.expect("Remove failed");
    assert_eq!(cart.weight(), Grams::from(2_000));
}

#[tokio::test]
async fn clear_hands_back_an_empty_cart() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_clear_cart().times(1).returning(|| {
        Ok(CartCleared { success: true, message: "Cart cleared successfully".to_string(), items_removed: 3 })
    });
    backend.expect_fetch_cart().times(1).returning(|| Ok(empty_cart()));

    let api = CartApi::new(backend);
    let cart = api.clear().await.expect("Clear failed");
    assert!(cart.is_empty());
    assert!(cart.total().is_zero());
}
