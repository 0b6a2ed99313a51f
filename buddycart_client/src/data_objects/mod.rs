//! Wire types for the storefront backend's JSON contract.
//!
//! The backend is a little inconsistent about casing and field spellings in places; the types here absorb those
//! quirks (case-insensitive status values, aliased id fields) so the rest of the crate only ever sees one shape.

mod auth;
mod catalog;
mod club;
mod settlement;

pub use auth::{Credentials, NewUser, TokenResponse, User};
pub use catalog::{Cart, CartCleared, CartLine, NewCartItem, Product};
pub use club::{
    ClubReadiness,
    ClubbedCart,
    ClubbedLine,
    ClubbedOrderId,
    ClubbedParticipant,
    Location,
    OrderStatus,
    QueueId,
    QueueJoinRequest,
    QueueJoined,
    QueueStatus,
    QueueStatusReport,
};
pub use settlement::{
    CancellationNotice,
    CancellationReason,
    CancellationRequest,
    CommitAck,
    CommitmentReport,
    ConfirmAck,
    PaymentCommitment,
    PaymentConfirmation,
    PaymentMethod,
    PaymentStatus,
    SettlementSummary,
    UserOrder,
    UserOrderId,
    UserOrdersCreated,
};
