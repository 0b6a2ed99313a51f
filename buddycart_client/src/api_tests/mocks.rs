use async_trait::async_trait;
use buddycart_common::Secret;
use mockall::mock;

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
    traits::StorefrontBackend,
};

mock! {
    pub Backend {}
    #[async_trait]
    impl StorefrontBackend for Backend {
        async fn set_bearer_token(&self, token: Option<Secret<String>>);
        async fn register(&self, new_user: &NewUser) -> Result<User, ClientError>;
        async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ClientError>;
        async fn me(&self) -> Result<User, ClientError>;
        async fn products(&self) -> Result<Vec<Product>, ClientError>;
        async fn fetch_cart(&self) -> Result<Cart, ClientError>;
        async fn add_cart_item(&self, item: &NewCartItem) -> Result<CartLine, ClientError>;
        async fn update_cart_quantity(&self, line_id: &str, quantity: u32) -> Result<(), ClientError>;
        async fn remove_cart_item(&self, line_id: &str) -> Result<(), ClientError>;
        async fn clear_cart(&self) -> Result<CartCleared, ClientError>;
        async fn check_readiness(&self, location: &Location) -> Result<ClubReadiness, ClientError>;
        async fn join_queue(&self, request: &QueueJoinRequest) -> Result<QueueJoined, ClientError>;
        async fn queue_status(&self, queue_id: &QueueId) -> Result<QueueStatusReport, ClientError>;
        async fn leave_queue(&self, queue_id: &QueueId) -> Result<(), ClientError>;
        async fn fetch_clubbed_cart(&self, id: &ClubbedOrderId) -> Result<ClubbedCart, ClientError>;
        async fn add_clubbed_item(&self, id: &ClubbedOrderId, item: &NewCartItem) -> Result<ClubbedLine, ClientError>;
        async fn create_user_orders(&self, id: &ClubbedOrderId) -> Result<UserOrdersCreated, ClientError>;
        async fn settlement_summary(&self, id: &ClubbedOrderId) -> Result<SettlementSummary, ClientError>;
        async fn commitment_status(&self, id: &ClubbedOrderId) -> Result<CommitmentReport, ClientError>;
        async fn my_user_orders(&self) -> Result<Vec<UserOrder>, ClientError>;
        async fn commit_payment(&self, commitment: &PaymentCommitment) -> Result<CommitAck, ClientError>;
        async fn confirm_payment(&self, confirmation: &PaymentConfirmation) -> Result<ConfirmAck, ClientError>;
        async fn cancel_user_order(&self, request: &CancellationRequest) -> Result<CancellationNotice, ClientError>;
    }
}
