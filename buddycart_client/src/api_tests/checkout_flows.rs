use buddycart_common::{Rupee, Secret};
use chrono::{Duration, Utc};

use super::{
    helpers::{cart_490, sample_user, settlement_summary, temp_store},
    mocks::MockBackend,
};
use crate::{
    checkout::{CheckoutApi, DeliveryDetails, DELIVERY_FEE},
    data_objects::CartCleared,
    errors::ClientError,
    state::{ClubMarker, QueueMarker, SessionRecord},
};

fn delivery() -> DeliveryDetails {
    DeliveryDetails {
        address: "14 MG Road, Indiranagar".to_string(),
        phone: "9876543210".to_string(),
        special_instructions: Some("Ring the bell twice".to_string()),
    }
}

fn cleared() -> CartCleared {
    CartCleared { success: true, message: "Cart cleared successfully".to_string(), items_removed: 3 }
}

#[tokio::test]
async fn solo_orders_add_the_flat_delivery_fee() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_session(SessionRecord { token: Secret::new("tok".to_string()), user: sample_user() }).unwrap();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    store.set_club_marker(ClubMarker { clubbed_order_id: "club-9".to_string().into(), discount_given: Rupee::default() }).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_clear_cart().times(1).returning(|| Ok(cleared()));

    let api = CheckoutApi::new(backend, store.clone());
    let confirmation = api.place_solo_order(&cart_490(), &delivery()).await.expect("Checkout failed");
    assert_eq!(confirmation.subtotal, Rupee::from_rupees(490));
    assert_eq!(confirmation.delivery_fee, DELIVERY_FEE);
    assert_eq!(confirmation.total, Rupee::from_rupees(530));
    assert!(confirmation.savings.is_zero());
    assert!(!confirmation.clubbed);
    assert!(confirmation.order_ref.starts_with("ORDER-"));

    // Checkout resets the flow markers but never touches the session.
    let state = store.read().unwrap();
    assert!(state.queue.is_none());
    assert!(state.club.is_none());
    assert!(state.session.is_some());
}

#[tokio::test]
async fn clubbed_orders_take_every_amount_from_the_summary() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let mut backend = MockBackend::new();
    backend.expect_clear_cart().times(1).returning(|| Ok(cleared()));

    let api = CheckoutApi::new(backend, store.clone());
    let summary = settlement_summary("club-42");
    let confirmation = api.place_clubbed_order(&summary, &delivery(), 2).await.expect("Checkout failed");
    assert_eq!(confirmation.subtotal, summary.your_portion);
    assert_eq!(confirmation.delivery_fee, summary.delivery_fee);
    assert_eq!(confirmation.total, summary.final_amount_to_pay);
    assert_eq!(confirmation.savings, Rupee::from_rupees(35));
    assert!(confirmation.clubbed);
    assert_eq!(confirmation.buddy_count, 2);
}

#[tokio::test]
async fn clubbed_orders_fall_back_to_the_match_discount() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store
        .set_club_marker(ClubMarker { clubbed_order_id: "club-42".to_string().into(), discount_given: Rupee::from_rupees(35) })
        .unwrap();
    let mut backend = MockBackend::new();
    backend.expect_clear_cart().times(1).returning(|| Ok(cleared()));

    let api = CheckoutApi::new(backend, store.clone());
    let mut summary = settlement_summary("club-42");
    summary.discount_applied = Rupee::default();
    let confirmation = api.place_clubbed_order(&summary, &delivery(), 2).await.expect("Checkout failed");
    assert_eq!(confirmation.savings, Rupee::from_rupees(35));
}

#[tokio::test]
async fn delivery_details_are_validated_before_anything_happens() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    // No expectations: clearing the cart for an invalid order would fail the test.
    let api = CheckoutApi::new(MockBackend::new(), store.clone());
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();

    let mut missing_phone = delivery();
    missing_phone.phone = " ".to_string();
    let err = api.place_solo_order(&cart_490(), &missing_phone).await.expect_err("Expected a validation error");
    assert!(matches!(err, ClientError::Validation(_)));
    // A failed validation leaves the markers alone.
    assert!(store.queue_marker().unwrap().is_some());
}

#[tokio::test]
async fn empty_carts_cannot_be_checked_out() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let api = CheckoutApi::new(MockBackend::new(), store);
    let empty = super::helpers::empty_cart();
    let err = api.place_solo_order(&empty, &delivery()).await.expect_err("Expected a validation error");
    assert!(matches!(err, ClientError::Validation(_)));
}
