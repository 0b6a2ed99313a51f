//! Events delivered to matching and settlement subscribers.
//!
//! Subscriptions push events into an async handler rather than exposing a stream: the handler has no access to
//! the subscription's internals and receives nothing but the event itself. Terminal events arrive exactly once,
//! and any persistent state they describe has already been written by the time the handler runs.

use std::{future::Future, pin::Pin, sync::Arc};

use buddycart_common::Rupee;

use crate::data_objects::{ClubbedOrderId, CommitmentReport};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Progress of a buddy-queue wait.
///
/// `Matched`, `TimedOut` and `Failed` are terminal: the workers stop, and exactly one of them is emitted per
/// subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// Once-a-second countdown. Derived from the persisted start time, so the value never increases and the last
    /// tick before expiry reads exactly zero.
    Tick { remaining_secs: i64 },
    /// A status poll found the entry still waiting. `nearby_users` is the matcher's current candidate count, when
    /// the server reports one.
    Waiting { nearby_users: Option<u32> },
    /// Matched into a clubbed order. The club marker holding these values is persisted before this event fires.
    Matched {
        clubbed_order_id: ClubbedOrderId,
        discount_given: Rupee,
    },
    /// The wait window ran out, locally or server-side, or the entry vanished from the queue.
    TimedOut,
    /// The subscription gave up: the token was rejected or the backend stayed unreachable.
    Failed { reason: String },
}

impl MatchEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Matched { .. } | Self::TimedOut | Self::Failed { .. })
    }
}

/// Progress of a settlement watch.
///
/// `OrderConfirmed` is the only terminal event; poll failures are logged and retried indefinitely, since a
/// payment round must not be abandoned over a flaky connection.
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementEvent {
    /// A fresh commitment report, one per successful poll.
    StatusUpdate(CommitmentReport),
    /// Every participant has now committed. Emitted once, on the poll that observes the transition.
    AllCommitted,
    /// Every payment is confirmed and the clubbed order is placed. Polling stops here.
    OrderConfirmed(CommitmentReport),
}

impl SettlementEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::OrderConfirmed(_))
    }
}
