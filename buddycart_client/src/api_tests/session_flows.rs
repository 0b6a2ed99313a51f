use buddycart_common::Secret;
use chrono::{Duration, Utc};

use super::{
    helpers::{sample_user, temp_store, token_response},
    mocks::MockBackend,
};
use crate::{
    data_objects::Credentials,
    errors::ClientError,
    session::SessionApi,
    state::{ClubMarker, QueueMarker, SessionRecord},
};

fn credentials() -> Credentials {
    Credentials::new("priya@example.com", "hunter2")
}

#[tokio::test]
async fn login_activates_the_token_and_persists_the_session() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let mut backend = MockBackend::new();
    backend.expect_login().times(1).returning(|_| Ok(token_response("tok-abc")));
    backend.expect_set_bearer_token().times(1).withf(|token| token.is_some()).returning(|_| ());
    backend.expect_me().times(1).returning(|| Ok(sample_user()));

    let api = SessionApi::new(backend, store.clone());
    let user = api.login(credentials()).await.expect("Login failed");
    assert_eq!(user.email, "priya@example.com");

    let record = store.session().unwrap().expect("No session was stored");
    assert_eq!(record.token.reveal(), "tok-abc");
    assert_eq!(record.user, user);
}

#[tokio::test]
async fn login_surfaces_the_servers_auth_message() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let mut backend = MockBackend::new();
    backend.expect_login().times(1).returning(|_| Err(ClientError::Auth("Incorrect email or password".to_string())));

    let api = SessionApi::new(backend, store.clone());
    let err = api.login(credentials()).await.expect_err("Expected the login to fail");
    assert!(err.is_auth());
    assert!(err.to_string().contains("Incorrect email or password"));
    assert!(store.session().unwrap().is_none());
}

#[tokio::test]
async fn register_signs_straight_in() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let mut backend = MockBackend::new();
    backend.expect_register().times(1).returning(|_| Ok(sample_user()));
    backend.expect_login().times(1).returning(|_| Ok(token_response("tok-new")));
    backend.expect_set_bearer_token().times(1).withf(|token| token.is_some()).returning(|_| ());
    backend.expect_me().times(1).returning(|| Ok(sample_user()));

    let api = SessionApi::new(backend, store.clone());
    let new_user = crate::data_objects::NewUser {
        name: "Priya".to_string(),
        email: "priya@example.com".to_string(),
        password: Secret::new("hunter2".to_string()),
        phone: None,
        address: None,
    };
    let user = api.register(new_user).await.expect("Registration failed");
    assert_eq!(user.email, "priya@example.com");
    assert!(store.session().unwrap().is_some());
}

#[tokio::test]
async fn restore_returns_none_when_nothing_is_stored() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    let api = SessionApi::new(MockBackend::new(), store);
    assert!(api.restore().await.unwrap().is_none());
}

#[tokio::test]
async fn restore_revalidates_a_stored_token() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_session(SessionRecord { token: Secret::new("tok-abc".to_string()), user: sample_user() }).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_set_bearer_token().times(1).withf(|token| token.is_some()).returning(|_| ());
    backend.expect_me().times(1).returning(|| Ok(sample_user()));

    let api = SessionApi::new(backend, store);
    let user = api.restore().await.unwrap().expect("Expected a restored session");
    assert_eq!(user.email, "priya@example.com");
}

#[tokio::test]
async fn restore_wipes_state_when_the_token_is_rejected() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_session(SessionRecord { token: Secret::new("tok-stale".to_string()), user: sample_user() }).unwrap();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    let mut backend = MockBackend::new();
    backend.expect_set_bearer_token().times(1).withf(|token| token.is_some()).returning(|_| ());
    backend.expect_me().times(1).returning(|| Err(ClientError::Auth("Could not validate credentials".to_string())));
    backend.expect_set_bearer_token().times(1).withf(|token| token.is_none()).returning(|_| ());

    let api = SessionApi::new(backend, store.clone());
    assert!(api.restore().await.unwrap().is_none());
    let state = store.read().unwrap();
    assert!(state.session.is_none());
    assert!(state.queue.is_none());
}

#[tokio::test]
async fn logout_clears_every_marker() {
    let _ = env_logger::try_init().ok();
    let (_dir, store) = temp_store();
    store.set_session(SessionRecord { token: Secret::new("tok-abc".to_string()), user: sample_user() }).unwrap();
    store.set_queue_marker(QueueMarker::new("q-1".to_string().into(), Utc::now(), Duration::minutes(5))).unwrap();
    store
        .set_club_marker(ClubMarker {
            clubbed_order_id: "club-9".to_string().into(),
            discount_given: buddycart_common::Rupee::from_rupees(35),
        })
        .unwrap();
    let mut backend = MockBackend::new();
    backend.expect_set_bearer_token().times(1).withf(|token| token.is_none()).returning(|_| ());

    let api = SessionApi::new(backend, store.clone());
    api.logout().await.expect("Logout failed");
    let state = store.read().unwrap();
    assert!(state.session.is_none());
    assert!(state.queue.is_none());
    assert!(state.club.is_none());
}
