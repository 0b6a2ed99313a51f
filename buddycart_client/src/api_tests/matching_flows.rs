use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use buddycart_common::Rupee;
use chrono::{Duration, Utc};

use super::{
    helpers::{cart_490, empty_cart, expired_report, matched_report, queue_joined, recording_handler, temp_store, wait_until, waiting_report},
    mocks::MockBackend,
};
use crate::{
    data_objects::Location,
    errors::ClientError,
    events::{Handler, MatchEvent},
    matching::MatchingApi,
    state::QueueMarker,
};

fn bangalore() -> Location {
    Location::new(12.9716, 77.5946)
}

const FAST_TICK: StdDuration = StdDuration::from_millis(10);
const FAST_POLL: StdDuration = StdDuration::from_millis(20);
const TEST_DEADLINE: StdDuration = StdDuration::from_secs(10);

#[tokio::test]
async fn join_submits_the_cart_totals() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let mut backend = MockBackend::new();
    backend
        .expect_join_queue()
        .times(1)
        .withf(|request| {
            request.cart_id == "cart-1"
                && request.value_total == Rupee::from_rupees(490)
                && request.weight_total == 2.0
                && request.timeout_minutes == 5
        })
        .returning(|_| Ok(queue_joined("q-1")));

    let api = MatchingApi::new(backend, store.clone());
    let marker = api.join(&cart_490(), bangalore(), Duration::minutes(5)).await.expect("Join failed");
    assert_eq!(marker.queue_id.as_str(), "q-1");
    assert_eq!(marker.duration_secs, 300);
    assert_eq!(store.queue_marker().unwrap().unwrap().queue_id.as_str(), "q-1");
}

#[tokio::test]
async fn join_rejects_bad_input_before_the_wire() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let api = MatchingApi::new(MockBackend::new(), store);
    let err = api.join(&empty_cart(), bangalore(), Duration::minutes(5)).await.expect_err("Expected a validation error");
    assert!(matches!(err, ClientError::Validation(_)));
    let err = api
        .join(&cart_490(), Location::new(100.0, 77.5946), Duration::minutes(5))
        .await
        .expect_err("Expected a validation error");
    assert!(matches!(err, ClientError::Validation(_)));
    let err = api.join(&cart_490(), bangalore(), Duration::zero()).await.expect_err("Expected a validation error");
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn join_reuses_an_entry_that_is_still_waiting() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let started = Utc::now() - Duration::seconds(120);
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), started, Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    // join_queue has no expectation, so a second join going over the wire would fail the test.
    backend.expect_queue_status().times(1).returning(|_| Ok(waiting_report(2)));

    let api = MatchingApi::new(backend, store.clone());
    let marker = api.join(&cart_490(), bangalore(), Duration::minutes(5)).await.expect("Join failed");
    assert_eq!(marker.queue_id.as_str(), "q-1");
    // The original start time survives, so the remaining window keeps running down.
    assert_eq!(marker.started_at, started);
    assert!(marker.remaining_secs(Utc::now()) <= 180);
}

#[tokio::test]
async fn join_replaces_a_finished_entry() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-old".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_queue_status().times(1).returning(|_| Ok(expired_report()));
    backend.expect_join_queue().times(1).returning(|_| Ok(queue_joined("q-new")));

    let api = MatchingApi::new(backend, store.clone());
    let marker = api.join(&cart_490(), bangalore(), Duration::minutes(5)).await.expect("Join failed");
    assert_eq!(marker.queue_id.as_str(), "q-new");
    assert_eq!(store.queue_marker().unwrap().unwrap().queue_id.as_str(), "q-new");
}

#[tokio::test]
async fn subscription_times_out_and_clears_the_marker() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::zero())).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_queue_status().returning(|_| Ok(waiting_report(0)));

    let api = MatchingApi::new(backend, store.clone());
    let (handler, events) = recording_handler::<MatchEvent>();
    let sub = api.subscribe_every(handler, FAST_TICK, FAST_POLL).expect("Subscribe failed");
    wait_until(|| events.lock().unwrap().iter().any(MatchEvent::is_terminal), TEST_DEADLINE).await;
    sub.cancel();

    let events = events.lock().unwrap().clone();
    let terminal: Vec<&MatchEvent> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal, vec![&MatchEvent::TimedOut]);
    assert!(events.contains(&MatchEvent::Tick { remaining_secs: 0 }));
    assert!(store.queue_marker().unwrap().is_none());
}

#[tokio::test]
async fn countdown_is_monotonic_and_reconnect_preserves_the_remaining_window() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    // Joined two minutes ago with a five minute window; about three minutes should remain.
    let started = Utc::now() - Duration::seconds(120);
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), started, Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_queue_status().returning(|_| Ok(waiting_report(1)));

    let api = MatchingApi::new(backend, store.clone());
    let (handler, events) = recording_handler::<MatchEvent>();
    let mut sub = api.subscribe_every(handler, FAST_TICK, FAST_POLL).expect("Subscribe failed");
    wait_until(
        || events.lock().unwrap().iter().filter(|e| matches!(e, MatchEvent::Tick { .. })).count() >= 3,
        TEST_DEADLINE,
    )
    .await;
    sub.cancel();
    sub.wait().await;

    let events = events.lock().unwrap().clone();
    let ticks: Vec<i64> = events
        .iter()
        .filter_map(|e| match e {
            MatchEvent::Tick { remaining_secs } => Some(*remaining_secs),
            _ => None,
        })
        .collect();
    assert!(ticks.iter().all(|t| (175..=180).contains(t)), "Unexpected countdown values: {ticks:?}");
    assert!(ticks.windows(2).all(|w| w[1] <= w[0]), "The countdown went back up: {ticks:?}");
    assert!(!events.iter().any(MatchEvent::is_terminal));
    // Cancelling reports nothing and leaves the entry live for a later reconnect.
    assert!(store.queue_marker().unwrap().is_some());
}

#[tokio::test]
async fn match_outcome_is_persisted_before_the_event_fires() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_queue_status().returning(|_| Ok(matched_report("club-X", Rupee::from_rupees(35))));

    let api = MatchingApi::new(backend, store.clone());
    let marker_seen_in_handler = Arc::new(Mutex::new(None::<bool>));
    let observer = marker_seen_in_handler.clone();
    let probe_store = store.clone();
    let handler: Handler<MatchEvent> = Arc::new(move |event| {
        let observer = observer.clone();
        let store = probe_store.clone();
        Box::pin(async move {
            if let MatchEvent::Matched { .. } = event {
                let persisted = store.club_marker().ok().flatten().is_some();
                *observer.lock().unwrap() = Some(persisted);
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    let mut sub = api.subscribe_every(handler, FAST_TICK, FAST_POLL).expect("Subscribe failed");
    wait_until(|| marker_seen_in_handler.lock().unwrap().is_some(), TEST_DEADLINE).await;
    sub.wait().await;

    assert_eq!(*marker_seen_in_handler.lock().unwrap(), Some(true), "The event fired before the marker was written");
    let state = store.read().unwrap();
    assert!(state.queue.is_none());
    let club = state.club.expect("The club marker was not persisted");
    assert_eq!(club.clubbed_order_id.as_str(), "club-X");
    assert_eq!(club.discount_given, Rupee::from_rupees(35));
    assert!(sub.is_terminated());
}

#[tokio::test]
async fn vanished_entries_count_as_timed_out() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-gone".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_queue_status().returning(|_| Err(ClientError::NotFound("Buddy queue entry not found".to_string())));

    let api = MatchingApi::new(backend, store.clone());
    let (handler, events) = recording_handler::<MatchEvent>();
    let mut sub = api.subscribe_every(handler, FAST_TICK, FAST_POLL).expect("Subscribe failed");
    wait_until(|| events.lock().unwrap().iter().any(MatchEvent::is_terminal), TEST_DEADLINE).await;
    sub.wait().await;

    let events = events.lock().unwrap().clone();
    assert!(events.contains(&MatchEvent::TimedOut));
    assert!(store.queue_marker().unwrap().is_none());
}

#[tokio::test]
async fn subscription_gives_up_after_repeated_poll_failures() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_queue_status().returning(|_| Err(ClientError::Network("connection refused".to_string())));

    let api = MatchingApi::new(backend, store.clone());
    let (handler, events) = recording_handler::<MatchEvent>();
    let mut sub = api.subscribe_every(handler, FAST_TICK, FAST_POLL).expect("Subscribe failed");
    wait_until(|| events.lock().unwrap().iter().any(MatchEvent::is_terminal), TEST_DEADLINE).await;
    sub.wait().await;

    let events = events.lock().unwrap().clone();
    let failed = events.iter().any(|e| matches!(e, MatchEvent::Failed { reason } if reason.contains("connection refused")));
    assert!(failed, "Expected a failure event, got {events:?}");
    assert!(store.queue_marker().unwrap().is_none());
}

#[tokio::test]
async fn a_rejected_token_fails_the_watch_at_once() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    // One poll is enough; auth rejections are not retried.
    backend.expect_queue_status().times(1).returning(|_| Err(ClientError::Auth("Token has expired".to_string())));

    let api = MatchingApi::new(backend, store.clone());
    let (handler, events) = recording_handler::<MatchEvent>();
    let mut sub = api.subscribe_every(handler, FAST_TICK, FAST_POLL).expect("Subscribe failed");
    wait_until(|| events.lock().unwrap().iter().any(MatchEvent::is_terminal), TEST_DEADLINE).await;
    sub.wait().await;

    let events = events.lock().unwrap().clone();
    assert!(events.iter().any(|e| matches!(e, MatchEvent::Failed { reason } if reason.contains("Token has expired"))));
    assert!(store.queue_marker().unwrap().is_none());
}

#[tokio::test]
async fn one_shot_status_leaves_the_marker_alone() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_queue_status().times(1).returning(|_| Ok(expired_report()));

    let api = MatchingApi::new(backend, store.clone());
    let (marker, report) = api.status().await.expect("Status failed");
    assert_eq!(marker.queue_id.as_str(), "q-1");
    assert!(report.status.is_terminal());
    // Reading the status is not a transition; the marker survives until a join or watch acts on it.
    assert!(store.queue_marker().unwrap().is_some());
}

#[tokio::test]
async fn continue_alone_clears_the_marker_immediately() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_leave_queue().returning(|_| Ok(()));

    let api = MatchingApi::new(backend, store.clone());
    api.continue_alone().await.expect("Continue alone failed");
    assert!(store.queue_marker().unwrap().is_none());
    // A second call is a no-op.
    api.continue_alone().await.expect("Continue alone is not idempotent");
}

#[tokio::test]
async fn subscribe_requires_a_recorded_entry() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let api = MatchingApi::new(MockBackend::new(), store);
    let (handler, _events) = recording_handler::<MatchEvent>();
    let err = api.subscribe(handler).expect_err("Expected an error without a queue entry");
    assert!(matches!(err, ClientError::State(_)));
}
