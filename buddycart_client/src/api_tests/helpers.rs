//! Shared fixtures for the flow tests. Amounts and shapes mirror payloads captured from a dev backend.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use buddycart_common::{Grams, Rupee, Secret};
use chrono::{Duration, Utc};
use tempfile::TempDir;

use crate::{
    data_objects::{
        CancellationNotice,
        CancellationReason,
        Cart,
        CartLine,
        ClubbedOrderId,
        CommitmentReport,
        PaymentMethod,
        PaymentStatus,
        Product,
        QueueJoined,
        QueueStatus,
        QueueStatusReport,
        SettlementSummary,
        TokenResponse,
        User,
        UserOrder,
        UserOrderId,
    },
    events::Handler,
    state::StateStore,
};

pub fn temp_store() -> (TempDir, StateStore) {
    let dir = TempDir::new().expect("Could not create a temp dir");
    let store = StateStore::at(dir.path().join("state.toml"));
    (dir, store)
}

/// A handler that appends every event to a shared vector.
pub fn recording_handler<E: Send + 'static>() -> (Handler<E>, Arc<Mutex<Vec<E>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let handler: Handler<E> = Arc::new(move |event: E| {
        let sink = sink.clone();
        Box::pin(async move {
            sink.lock().unwrap().push(event);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    (handler, events)
}

/// Polls `condition` every few milliseconds until it holds, panicking after `timeout`.
pub async fn wait_until<F>(mut condition: F, timeout: StdDuration)
where F: FnMut() -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("Condition not met within {timeout:?}");
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
}

pub fn sample_user() -> User {
    User {
        id: "u-1".to_string(),
        name: "Priya".to_string(),
        email: "priya@example.com".to_string(),
        phone: Some("9876543210".to_string()),
        address: Some("14 MG Road, Indiranagar".to_string()),
        created_at: Utc::now(),
    }
}

pub fn token_response(token: &str) -> TokenResponse {
    TokenResponse { access_token: Secret::new(token.to_string()), token_type: "bearer".to_string() }
}

pub fn product(id: &str, price: Rupee, weight: Grams) -> Product {
    Product {
        id: id.to_string(),
        name: format!("product {id}"),
        price,
        weight_grams: weight,
        stock: 25,
        image_url: None,
        created_at: Utc::now(),
    }
}

pub fn cart_line(id: &str, quantity: u32, price: Rupee, weight: Grams) -> CartLine {
    CartLine {
        id: id.to_string(),
        product_id: format!("p-{id}"),
        quantity,
        total_price: price * i64::from(quantity),
        product: product(id, price, weight),
    }
}

/// Two lines worth ₹490 and 2kg altogether; the stock cart for matching tests.
pub fn cart_490() -> Cart {
    Cart {
        id: "cart-1".to_string(),
        user_id: "u-1".to_string(),
        is_active: true,
        created_at: Utc::now(),
        cart_items: vec![
            cart_line("a", 2, Rupee::from_rupees(120), Grams::from(500)),
            cart_line("b", 1, Rupee::from_rupees(250), Grams::from(1_000)),
        ],
    }
}

pub fn empty_cart() -> Cart {
    Cart { id: "cart-1".to_string(), user_id: "u-1".to_string(), is_active: true, created_at: Utc::now(), cart_items: vec![] }
}

pub fn queue_joined(id: &str) -> QueueJoined {
    QueueJoined {
        id: id.to_string().into(),
        user_id: "u-1".to_string(),
        status: QueueStatus::Waiting,
        created_at: Utc::now(),
        timeout_minutes: 5,
    }
}

pub fn waiting_report(nearby: u32) -> QueueStatusReport {
    QueueStatusReport {
        status: QueueStatus::Waiting,
        created_at: Some(Utc::now()),
        nearby_users: Some(nearby),
        clubbed_order_id: None,
        discount_given: None,
    }
}

pub fn matched_report(club_id: &str, discount: Rupee) -> QueueStatusReport {
    QueueStatusReport {
        status: QueueStatus::Matched,
        created_at: None,
        nearby_users: None,
        clubbed_order_id: Some(club_id.to_string().into()),
        discount_given: Some(discount),
    }
}

pub fn expired_report() -> QueueStatusReport {
    QueueStatusReport {
        status: QueueStatus::TimedOut,
        created_at: None,
        nearby_users: None,
        clubbed_order_id: None,
        discount_given: None,
    }
}

pub fn commitment_report(club_id: &str, committed: &[&str], pending: &[&str], confirmed: bool) -> CommitmentReport {
    CommitmentReport {
        clubbed_order_id: club_id.to_string().into(),
        commitment_deadline: Utc::now() + Duration::minutes(10),
        committed_users: committed.iter().map(|s| s.to_string()).collect(),
        pending_users: pending.iter().map(|s| s.to_string()).collect(),
        all_committed: pending.is_empty(),
        order_confirmed: confirmed,
    }
}

pub fn settlement_summary(club_id: &str) -> SettlementSummary {
    SettlementSummary {
        clubbed_order_id: club_id.to_string().into(),
        total_order_value: Rupee::from_rupees(900),
        your_portion: Rupee::from_rupees(490),
        other_users_portion: Rupee::from_rupees(410),
        delivery_fee: Rupee::from_rupees(20),
        discount_applied: Rupee::from_rupees(35),
        final_amount_to_pay: Rupee::from_rupees(475),
        payment_deadline: Utc::now() + Duration::minutes(10),
        all_users_committed: false,
        confirmed_payments: 0,
        pending_payments: 2,
    }
}

pub fn user_order(id: &str, club_id: &str) -> UserOrder {
    UserOrder {
        id: UserOrderId(id.to_string()),
        clubbed_order_id: ClubbedOrderId(club_id.to_string()),
        user_id: "u-1".to_string(),
        individual_total: Rupee::from_rupees(490),
        payment_method: PaymentMethod::Online,
        payment_status: PaymentStatus::Pending,
        commitment_deadline: Utc::now() + Duration::minutes(10),
        is_committed: false,
        delivery_address: "14 MG Road, Indiranagar".to_string(),
        delivery_phone: "9876543210".to_string(),
        special_instructions: None,
        created_at: Utc::now(),
    }
}

pub fn cancellation_notice(user_order_id: &str, club_id: &str) -> CancellationNotice {
    CancellationNotice {
        id: "cancel-1".to_string(),
        user_order_id: UserOrderId(user_order_id.to_string()),
        clubbed_order_id: ClubbedOrderId(club_id.to_string()),
        cancelled_by_user_id: "u-1".to_string(),
        cancellation_reason: CancellationReason::UserWithdrew,
        cancellation_fee: Rupee::from_rupees(24),
        compensation_amount: Rupee::from_rupees(12),
        cancelled_at: Utc::now(),
    }
}
