//! The [`StorefrontBackend`] trait collects every backend call the client makes behind one mockable surface.
//!
//! The only production implementation is [`HttpBackend`](crate::backend::HttpBackend). The higher-level APIs
//! ([`SessionApi`](crate::session::SessionApi), [`MatchingApi`](crate::matching::MatchingApi) and friends) are
//! generic over this trait so that every flow can be driven against a mock in tests, with the wire layer swapped
//! out wholesale.

use async_trait::async_trait;
use buddycart_common::Secret;

use crate::{
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
};

#[async_trait]
pub trait StorefrontBackend {
    /// Makes `token` the bearer identity for every subsequent call on this backend. `None` reverts to anonymous.
    async fn set_bearer_token(&self, token: Option<Secret<String>>);

    //----------------------------------------   Accounts   ----------------------------------------
    async fn register(&self, new_user: &NewUser) -> Result<User, ClientError>;
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ClientError>;
    /// The profile belonging to the active bearer token.
    async fn me(&self) -> Result<User, ClientError>;

    //----------------------------------------   Catalog and cart   ----------------------------------------
    async fn products(&self) -> Result<Vec<Product>, ClientError>;
    /// The caller's active cart. The backend creates an empty one on first access.
    async fn fetch_cart(&self) -> Result<Cart, ClientError>;
    async fn add_cart_item(&self, item: &NewCartItem) -> Result<CartLine, ClientError>;
    async fn update_cart_quantity(&self, line_id: &str, quantity: u32) -> Result<(), ClientError>;
    async fn remove_cart_item(&self, line_id: &str) -> Result<(), ClientError>;
    async fn clear_cart(&self) -> Result<CartCleared, ClientError>;

    //----------------------------------------   Buddy queue   ----------------------------------------
    async fn check_readiness(&self, location: &Location) -> Result<ClubReadiness, ClientError>;
    async fn join_queue(&self, request: &QueueJoinRequest) -> Result<QueueJoined, ClientError>;
    async fn queue_status(&self, queue_id: &QueueId) -> Result<QueueStatusReport, ClientError>;
    /// Withdraws the entry from the queue. Succeeds trivially if the entry has already been removed.
    async fn leave_queue(&self, queue_id: &QueueId) -> Result<(), ClientError>;

    //----------------------------------------   Clubbed orders   ----------------------------------------
    async fn fetch_clubbed_cart(&self, id: &ClubbedOrderId) -> Result<ClubbedCart, ClientError>;
    async fn add_clubbed_item(&self, id: &ClubbedOrderId, item: &NewCartItem) -> Result<ClubbedLine, ClientError>;

    //----------------------------------------   Split payment   ----------------------------------------
    async fn create_user_orders(&self, id: &ClubbedOrderId) -> Result<UserOrdersCreated, ClientError>;
    async fn settlement_summary(&self, id: &ClubbedOrderId) -> Result<SettlementSummary, ClientError>;
    async fn commitment_status(&self, id: &ClubbedOrderId) -> Result<CommitmentReport, ClientError>;
    /// Every user order belonging to the caller, across all clubbed orders.
    async fn my_user_orders(&self) -> Result<Vec<UserOrder>, ClientError>;
    async fn commit_payment(&self, commitment: &PaymentCommitment) -> Result<CommitAck, ClientError>;
    async fn confirm_payment(&self, confirmation: &PaymentConfirmation) -> Result<ConfirmAck, ClientError>;
    async fn cancel_user_order(&self, request: &CancellationRequest) -> Result<CancellationNotice, ClientError>;
}
