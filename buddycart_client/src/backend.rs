//! [`HttpBackend`] maps every [`StorefrontBackend`] call onto its REST endpoint.
//!
//! This module owns the route table and nothing else. Quirk absorption lives in the data objects and error
//! handling in [`RestClient`], so each method here is a one-liner naming the path and the response type.

use async_trait::async_trait;
use buddycart_common::Secret;
use log::*;
use serde::Deserialize;

use crate::{
    config::ClientConfig,
    data_objects::{
        CancellationNotice,
        CancellationRequest,
        Cart,
        CartCleared,
        CartLine,
        ClubReadiness,
        ClubbedCart,
        ClubbedLine,
        ClubbedOrderId,
        CommitAck,
        CommitmentReport,
        ConfirmAck,
        Credentials,
        Location,
        NewCartItem,
        NewUser,
        PaymentCommitment,
        PaymentConfirmation,
        Product,
        QueueId,
        QueueJoinRequest,
        QueueJoined,
        QueueStatusReport,
        SettlementSummary,
        TokenResponse,
        User,
        UserOrder,
        UserOrdersCreated,
    },
    errors::ClientError,
    rest::RestClient,
    traits::StorefrontBackend,
};

/// The production [`StorefrontBackend`], speaking HTTP+JSON to a BuddyCart server.
///
/// Clones share the underlying connection pool and bearer token slot, so one sign-in authenticates every API
/// holding a clone of the same backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    rest: RestClient,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self { rest: RestClient::new(config)? })
    }
}

#[derive(Debug, Deserialize)]
struct Ack {
    success: bool,
    message: String,
}

#[async_trait]
impl StorefrontBackend for HttpBackend {
    async fn set_bearer_token(&self, token: Option<Secret<String>>) {
        self.rest.set_token(token).await
    }

    async fn register(&self, new_user: &NewUser) -> Result<User, ClientError> {
        self.rest.post("/auth/register", new_user).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ClientError> {
        self.rest.post("/auth/login", credentials).await
    }

    async fn me(&self) -> Result<User, ClientError> {
        self.rest.get("/auth/me").await
    }

    async fn products(&self) -> Result<Vec<Product>, ClientError> {
        self.rest.get("/products/").await
    }

    async fn fetch_cart(&self) -> Result<Cart, ClientError> {
        self.rest.get("/cart/").await
    }

    async fn add_cart_item(&self, item: &NewCartItem) -> Result<CartLine, ClientError> {
        self.rest.post("/cart/items", item).await
    }

    // The new quantity travels in the query string. The response shape is not part of the contract, so it is
    // discarded and callers refetch the cart.
    async fn update_cart_quantity(&self, line_id: &str, quantity: u32) -> Result<(), ClientError> {
        let _: serde_json::Value = self.rest.put_empty(&format!("/cart/items/{line_id}/quantity?quantity={quantity}")).await?;
        Ok(())
    }

    async fn remove_cart_item(&self, line_id: &str) -> Result<(), ClientError> {
        let ack: Ack = self.rest.delete(&format!("/cart/items/{line_id}")).await?;
        debug!("Removed cart line {line_id} ({}): {}", ack.success, ack.message);
        Ok(())
    }

    async fn clear_cart(&self) -> Result<CartCleared, ClientError> {
        self.rest.delete("/cart/clear").await
    }

    async fn check_readiness(&self, location: &Location) -> Result<ClubReadiness, ClientError> {
        self.rest.post("/club/check-readiness", location).await
    }

    async fn join_queue(&self, request: &QueueJoinRequest) -> Result<QueueJoined, ClientError> {
        self.rest.post("/club/join-queue", request).await
    }

    async fn queue_status(&self, queue_id: &QueueId) -> Result<QueueStatusReport, ClientError> {
        self.rest.get(&format!("/club/status/{queue_id}")).await
    }

    async fn leave_queue(&self, queue_id: &QueueId) -> Result<(), ClientError> {
        let ack: Ack = self.rest.post_empty(&format!("/club/leave-queue/{queue_id}")).await?;
        debug!("Left queue {queue_id} ({}): {}", ack.success, ack.message);
        Ok(())
    }

    async fn fetch_clubbed_cart(&self, id: &ClubbedOrderId) -> Result<ClubbedCart, ClientError> {
        self.rest.get(&format!("/clubbed-cart/{id}")).await
    }

    async fn add_clubbed_item(&self, id: &ClubbedOrderId, item: &NewCartItem) -> Result<ClubbedLine, ClientError> {
        self.rest.post(&format!("/clubbed-cart/{id}/items"), item).await
    }

    async fn create_user_orders(&self, id: &ClubbedOrderId) -> Result<UserOrdersCreated, ClientError> {
        self.rest.post_empty(&format!("/split-payment/create-user-orders/{id}")).await
    }

    async fn settlement_summary(&self, id: &ClubbedOrderId) -> Result<SettlementSummary, ClientError> {
        self.rest.get(&format!("/split-payment/summary/{id}")).await
    }

    async fn commitment_status(&self, id: &ClubbedOrderId) -> Result<CommitmentReport, ClientError> {
        self.rest.get(&format!("/split-payment/status/{id}")).await
    }

    async fn my_user_orders(&self) -> Result<Vec<UserOrder>, ClientError> {
        self.rest.get("/split-payment/my-orders").await
    }

    async fn commit_payment(&self, commitment: &PaymentCommitment) -> Result<CommitAck, ClientError> {
        self.rest.post("/split-payment/commit", commitment).await
    }

    async fn confirm_payment(&self, confirmation: &PaymentConfirmation) -> Result<ConfirmAck, ClientError> {
        self.rest.post("/split-payment/confirm", confirmation).await
    }

    async fn cancel_user_order(&self, request: &CancellationRequest) -> Result<CancellationNotice, ClientError> {
        self.rest.post("/split-payment/cancel", request).await
    }
}
