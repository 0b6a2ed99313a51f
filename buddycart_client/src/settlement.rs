//! Split payment: per-user orders, commitments, confirmations and cancellation.
//!
//! The server is the ledger here. Shares, fees and discounts all arrive computed; the client's job is to create
//! the per-user orders exactly once, present the caller's share, push the caller's commitment and confirmation
//! through, and watch the group until every payment is confirmed.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration as StdDuration,
};

use log::*;
use tokio::task::JoinHandle;

use crate::{
    data_objects::{
        CancellationNotice,
        CancellationReason,
        CancellationRequest,
        ClubbedOrderId,
        CommitAck,
        CommitmentReport,
        ConfirmAck,
        PaymentCommitment,
        PaymentConfirmation,
        SettlementSummary,
        UserOrder,
        UserOrderId,
        UserOrdersCreated,
    },
    errors::ClientError,
    events::{Handler, SettlementEvent},
    state::StateStore,
    traits::StorefrontBackend,
};

/// Cadence of the commitment polls.
pub const SETTLEMENT_POLL_INTERVAL: StdDuration = StdDuration::from_secs(10);

/// The caller's settlement summary together with the group-wide commitment report.
#[derive(Debug, Clone)]
pub struct SettlementOverview {
    pub summary: SettlementSummary,
    pub commitments: CommitmentReport,
}

pub struct SettlementApi<B> {
    backend: Arc<B>,
    store: StateStore,
}

impl<B> SettlementApi<B>
where B: StorefrontBackend + Send + Sync + 'static
{
    pub fn new(backend: B, store: StateStore) -> Self {
        Self { backend: Arc::new(backend), store }
    }

    /// Makes sure the per-user orders behind `id` exist, creating them if they do not. Safe to call any number of
    /// times and from several participants at once: when the orders already exist, the existing split is reported
    /// and nothing is created.
    pub async fn ensure_user_orders(&self, id: &ClubbedOrderId) -> Result<UserOrdersCreated, ClientError> {
        match self.backend.commitment_status(id).await {
            Ok(report) => {
                debug!("💳 User orders for clubbed order {id} already exist");
                Ok(UserOrdersCreated::from_existing(&report))
            },
            Err(e) if e.is_not_found() => {
                info!("💳 Creating user orders for clubbed order {id}");
                self.backend.create_user_orders(id).await
            },
            Err(e) => Err(e),
        }
    }

    /// The caller's share and the group commitment report, in one round.
    ///
    /// A not-found summary usually means the per-user orders have not been created yet, so they are created and
    /// the read is retried once. If the summary still does not exist the clubbed order itself is gone, and the
    /// stale club marker is cleared before the error is passed on.
    pub async fn overview(&self, id: &ClubbedOrderId) -> Result<SettlementOverview, ClientError> {
        let summary = match self.backend.settlement_summary(id).await {
            Ok(summary) => summary,
            Err(e) if e.is_not_found() => {
                info!("💳 No settlement for clubbed order {id} yet. Creating user orders and retrying");
                if let Err(e) = self.backend.create_user_orders(id).await {
                    if e.is_not_found() {
                        // Not just uncreated: the clubbed order itself is gone.
                        self.store.clear_club_marker()?;
                    }
                    return Err(e);
                }
                match self.backend.settlement_summary(id).await {
                    Ok(summary) => summary,
                    Err(e) if e.is_not_found() => {
                        self.store.clear_club_marker()?;
                        return Err(e);
                    },
                    Err(e) => return Err(e),
                }
            },
            Err(e) => return Err(e),
        };
        let commitments = self.backend.commitment_status(id).await?;
        Ok(SettlementOverview { summary, commitments })
    }

    /// Every user order belonging to the caller, across all clubbed orders.
    pub async fn my_user_orders(&self) -> Result<Vec<UserOrder>, ClientError> {
        self.backend.my_user_orders().await
    }

    /// The caller's own user order within clubbed order `id`.
    pub async fn my_user_order(&self, id: &ClubbedOrderId) -> Result<UserOrder, ClientError> {
        let orders = self.backend.my_user_orders().await?;
        orders
            .into_iter()
            .find(|order| order.clubbed_order_id == *id)
            .ok_or_else(|| ClientError::NotFound(format!("You have no user order in clubbed order {id}")))
    }

    /// Locks in the payment method and delivery details for the caller's share.
    ///
    /// A missing address or phone number fails here, before anything goes over the wire. The commitment deadline
    /// itself is the server's to enforce; a late commit comes back as a rejection carrying the server's message.
    pub async fn commit(&self, commitment: PaymentCommitment) -> Result<CommitAck, ClientError> {
        if commitment.delivery_address.trim().is_empty() {
            return Err(ClientError::Validation("A delivery address is required".to_string()));
        }
        if commitment.delivery_phone.trim().is_empty() {
            return Err(ClientError::Validation("A delivery phone number is required".to_string()));
        }
        let ack = self.backend.commit_payment(&commitment).await?;
        info!("💳 Commitment accepted for user order {}. {}", commitment.user_order_id, ack.next_step);
        Ok(ack)
    }

    /// Reports the caller's payment as completed.
    pub async fn confirm(&self, confirmation: PaymentConfirmation) -> Result<ConfirmAck, ClientError> {
        let ack = self.backend.confirm_payment(&confirmation).await?;
        info!("💰 Payment confirmed. {}", ack.next_step);
        Ok(ack)
    }

    /// Cancels the caller's user order and clears the club marker.
    ///
    /// The cancellation fee and any compensation for the remaining participants are the server's decision; they
    /// come back in the notice untouched.
    pub async fn cancel(&self, user_order_id: UserOrderId, reason: CancellationReason) -> Result<CancellationNotice, ClientError> {
        let request = CancellationRequest { user_order_id, cancellation_reason: reason };
        let notice = self.backend.cancel_user_order(&request).await?;
        self.store.clear_club_marker()?;
        info!("🚫 Cancelled user order {}. Fee {}, compensation {}", request.user_order_id, notice.cancellation_fee, notice.compensation_amount);
        Ok(notice)
    }

    /// Starts watching the commitment round for clubbed order `id`.
    pub fn subscribe(&self, id: ClubbedOrderId, handler: Handler<SettlementEvent>) -> SettlementSubscription {
        self.subscribe_every(id, handler, SETTLEMENT_POLL_INTERVAL)
    }

    /// As [`subscribe`](Self::subscribe), with an explicit poll cadence.
    pub fn subscribe_every(
        &self,
        id: ClubbedOrderId,
        handler: Handler<SettlementEvent>,
        interval: StdDuration,
    ) -> SettlementSubscription {
        let terminated = Arc::new(AtomicBool::new(false));
        let worker = start_commitment_poller(Arc::clone(&self.backend), id.clone(), handler, terminated.clone(), interval);
        SettlementSubscription { clubbed_order_id: id, terminated, worker: Some(worker) }
    }
}

//--------------------------------------  SettlementSubscription  --------------------------------------

/// A live settlement watch. Dropping it (or calling [`cancel`](Self::cancel)) aborts the poller.
pub struct SettlementSubscription {
    clubbed_order_id: ClubbedOrderId,
    terminated: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SettlementSubscription {
    pub fn clubbed_order_id(&self) -> &ClubbedOrderId {
        &self.clubbed_order_id
    }

    /// True once the order has been confirmed or the subscription was cancelled.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Stops the poller without emitting anything. Safe to call more than once.
    pub fn cancel(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        if let Some(handle) = &self.worker {
            handle.abort();
        }
    }

    /// Waits for the poller to wind down. Returns immediately on a second call.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("The commitment poller panicked: {e}");
                }
            }
        }
    }
}

impl Drop for SettlementSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn start_commitment_poller<B>(
    backend: Arc<B>,
    id: ClubbedOrderId,
    handler: Handler<SettlementEvent>,
    terminated: Arc<AtomicBool>,
    interval: StdDuration,
) -> JoinHandle<()>
where B: StorefrontBackend + Send + Sync + 'static
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let mut was_all_committed = false;
        loop {
            timer.tick().await;
            if terminated.load(Ordering::SeqCst) {
                break;
            }
            match backend.commitment_status(&id).await {
                Ok(report) => {
                    let newly_committed = report.all_committed && !was_all_committed;
                    was_all_committed = report.all_committed;
                    let confirmed = report.order_confirmed;
                    (handler)(SettlementEvent::StatusUpdate(report.clone())).await;
                    if newly_committed {
                        info!("💳 All participants of clubbed order {id} have committed");
                        (handler)(SettlementEvent::AllCommitted).await;
                    }
                    if confirmed {
                        if !terminated.swap(true, Ordering::SeqCst) {
                            info!("✅ Clubbed order {id} is confirmed");
                            (handler)(SettlementEvent::OrderConfirmed(report)).await;
                        }
                        break;
                    }
                },
                Err(e) => {
                    // A payment round in flight must not be abandoned over a flaky connection. Keep polling.
                    warn!("💳 The commitment poll for clubbed order {id} failed: {e}");
                },
            }
        }
        trace!("💳 Commitment poller for clubbed order {id} stopped");
    })
}
