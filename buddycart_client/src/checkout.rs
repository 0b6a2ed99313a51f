//! Final order assembly, solo or clubbed.
//!
//! The backend has no checkout endpoint. Placing an order is a client-side step: assemble the receipt, clear the
//! server cart, reset the local queue and club markers. The tracking timeline that follows is likewise a fixed,
//! client-side schedule and never represents backend truth.

use buddycart_common::Rupee;
use chrono::{DateTime, Duration, Utc};
use log::*;
use rand::Rng;
use serde::Serialize;

use crate::{
    data_objects::{Cart, SettlementSummary},
    errors::ClientError,
    state::StateStore,
    traits::StorefrontBackend,
};

/// Flat delivery fee on solo orders. Clubbed orders take their (shared) fee from the settlement summary instead.
pub const DELIVERY_FEE: Rupee = Rupee::from_rupees(40);
/// The delivery window quoted on every receipt.
pub const ESTIMATED_DELIVERY: &str = "20-30 minutes";

/// Delivery details collected at checkout.
#[derive(Debug, Clone)]
pub struct DeliveryDetails {
    pub address: String,
    pub phone: String,
    pub special_instructions: Option<String>,
}

/// The receipt for a placed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub order_ref: String,
    pub placed_at: DateTime<Utc>,
    pub subtotal: Rupee,
    pub delivery_fee: Rupee,
    pub savings: Rupee,
    pub total: Rupee,
    pub clubbed: bool,
    pub buddy_count: u32,
    pub estimated_delivery: String,
}

/// One stage of the post-checkout tracking view.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingStage {
    pub label: &'static str,
    pub at: DateTime<Utc>,
    pub completed: bool,
}

/// The fixed tracking schedule for a placed order. Purely cosmetic: the stages march off the order's timestamp,
/// not off anything the backend reports.
pub fn tracking_timeline(confirmation: &OrderConfirmation) -> Vec<TrackingStage> {
    let placed = confirmation.placed_at;
    vec![
        TrackingStage { label: "Order placed", at: placed, completed: true },
        TrackingStage { label: "Being prepared", at: placed + Duration::minutes(5), completed: false },
        TrackingStage { label: "Out for delivery", at: placed + Duration::minutes(20), completed: false },
        TrackingStage { label: "Delivered", at: placed + Duration::minutes(45), completed: false },
    ]
}

pub struct CheckoutApi<B> {
    backend: B,
    store: StateStore,
}

impl<B> CheckoutApi<B>
where B: StorefrontBackend + Sync
{
    pub fn new(backend: B, store: StateStore) -> Self {
        Self { backend, store }
    }

    /// Places a solo order: the cart subtotal plus the flat delivery fee. On success the server cart has been
    /// cleared and the local queue and club markers reset.
    pub async fn place_solo_order(&self, cart: &Cart, delivery: &DeliveryDetails) -> Result<OrderConfirmation, ClientError> {
        validate_delivery(delivery)?;
        if cart.is_empty() {
            return Err(ClientError::Validation("The cart is empty".to_string()));
        }
        let subtotal = cart.total();
        let confirmation = OrderConfirmation {
            order_ref: new_order_ref(),
            placed_at: Utc::now(),
            subtotal,
            delivery_fee: DELIVERY_FEE,
            savings: Rupee::default(),
            total: subtotal + DELIVERY_FEE,
            clubbed: false,
            buddy_count: 1,
            estimated_delivery: ESTIMATED_DELIVERY.to_string(),
        };
        self.finalize(&confirmation).await?;
        Ok(confirmation)
    }

    /// Places the caller's share of a clubbed order. Every amount comes from the settlement summary; nothing is
    /// recomputed locally. When the summary carries no discount, the one granted at match time (still in the club
    /// marker) is shown as the savings line.
    pub async fn place_clubbed_order(
        &self,
        summary: &SettlementSummary,
        delivery: &DeliveryDetails,
        buddy_count: u32,
    ) -> Result<OrderConfirmation, ClientError> {
        validate_delivery(delivery)?;
        let savings = if summary.discount_applied.is_zero() {
            self.store.club_marker()?.map(|marker| marker.discount_given).unwrap_or_default()
        } else {
            summary.discount_applied
        };
        let confirmation = OrderConfirmation {
            order_ref: new_order_ref(),
            placed_at: Utc::now(),
            subtotal: summary.your_portion,
            delivery_fee: summary.delivery_fee,
            savings,
            total: summary.final_amount_to_pay,
            clubbed: true,
            buddy_count,
            estimated_delivery: ESTIMATED_DELIVERY.to_string(),
        };
        self.finalize(&confirmation).await?;
        Ok(confirmation)
    }

    async fn finalize(&self, confirmation: &OrderConfirmation) -> Result<(), ClientError> {
        self.backend.clear_cart().await?;
        self.store.update(|state| {
            state.queue = None;
            state.club = None;
        })?;
        info!("🧾 Order {} placed for {}", confirmation.order_ref, confirmation.total);
        Ok(())
    }
}

fn new_order_ref() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(1000..10_000);
    format!("ORDER-{}-{suffix}", Utc::now().timestamp_millis())
}

fn validate_delivery(delivery: &DeliveryDetails) -> Result<(), ClientError> {
    if delivery.address.trim().is_empty() {
        return Err(ClientError::Validation("A delivery address is required".to_string()));
    }
    if delivery.phone.trim().is_empty() {
        return Err(ClientError::Validation("A delivery phone number is required".to_string()));
    }
    Ok(())
}
