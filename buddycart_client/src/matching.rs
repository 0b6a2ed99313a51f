//! The buddy-queue matching flow.
//!
//! Joining the queue is a one-shot call. Waiting for the outcome is a subscription owning two workers: a
//! once-a-second countdown derived from the persisted start time, and a five-second status poller. The first
//! terminal outcome (matched, timed out, or given up) wins and stops both workers, and dropping the subscription
//! aborts them, so a poller can never outlive its consumer.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration as StdDuration,
};

use buddycart_common::Rupee;
use chrono::{Duration, Utc};
use log::*;
use tokio::task::JoinHandle;

use crate::{
    data_objects::{Cart, ClubReadiness, ClubbedOrderId, Location, QueueId, QueueJoinRequest, QueueStatus, QueueStatusReport},
    errors::ClientError,
    events::{Handler, MatchEvent},
    state::{ClubMarker, QueueMarker, StateStore},
    traits::StorefrontBackend,
};

/// Cadence of the countdown ticks.
pub const TICK_INTERVAL: StdDuration = StdDuration::from_secs(1);
/// Cadence of the status polls while waiting for a match.
pub const POLL_INTERVAL: StdDuration = StdDuration::from_secs(5);
/// Consecutive transport failures tolerated before a subscription gives up.
pub const MAX_POLL_FAILURES: u32 = 3;

/// The buddy-queue API: readiness checks, joining, watching for the outcome, and giving up.
pub struct MatchingApi<B> {
    backend: Arc<B>,
    store: StateStore,
}

impl<B> MatchingApi<B>
where B: StorefrontBackend + Send + Sync + 'static
{
    pub fn new(backend: B, store: StateStore) -> Self {
        Self { backend: Arc::new(backend), store }
    }

    /// Asks the server whether clubbing is worth offering at `location` right now.
    pub async fn check_readiness(&self, location: Location) -> Result<ClubReadiness, ClientError> {
        if !location.is_valid() {
            return Err(ClientError::Validation("A valid location fix is required".to_string()));
        }
        self.backend.check_readiness(&location).await
    }

    /// Joins the buddy queue, or reconnects to an entry that is still waiting.
    ///
    /// A recorded entry that the server still reports as waiting is reused as-is. Its start time is left
    /// untouched, so the remaining wait keeps running down instead of restarting. Any other recorded entry
    /// (matched, expired, vanished or unverifiable) is discarded and a fresh join is made.
    pub async fn join(&self, cart: &Cart, location: Location, timeout: Duration) -> Result<QueueMarker, ClientError> {
        if cart.is_empty() {
            return Err(ClientError::Validation("Add items to your cart before joining the buddy queue".to_string()));
        }
        if !location.is_valid() {
            return Err(ClientError::Validation("A valid location fix is required to join the buddy queue".to_string()));
        }
        if timeout <= Duration::zero() {
            return Err(ClientError::Validation("The queue timeout must be positive".to_string()));
        }
        if let Some(marker) = self.store.queue_marker()? {
            match self.backend.queue_status(&marker.queue_id).await {
                Ok(report) if report.status == QueueStatus::Waiting => {
                    info!("🤝 Reconnecting to waiting queue entry {}", marker.queue_id);
                    return Ok(marker);
                },
                Ok(report) => {
                    debug!("Recorded queue entry {} is {}. Discarding it", marker.queue_id, report.status);
                    self.store.clear_queue_marker()?;
                },
                Err(e) => {
                    warn!("Could not verify recorded queue entry {}: {e}. Discarding it", marker.queue_id);
                    self.store.clear_queue_marker()?;
                },
            }
        }
        let request = QueueJoinRequest::from_cart(cart, location, timeout);
        debug!("Joining the buddy queue with cart {} worth {}", request.cart_id, cart.total());
        let joined = self.backend.join_queue(&request).await?;
        let marker = QueueMarker::new(joined.id.clone(), Utc::now(), timeout);
        self.store.set_queue_marker(marker.clone())?;
        info!("🤝 Joined the buddy queue as entry {}", joined.id);
        Ok(marker)
    }

    /// One-shot status of the recorded queue entry, alongside the marker driving the local countdown. Errors if
    /// there is no entry on record. Unlike a subscription poll this does not act on what it sees; markers are
    /// left exactly as they were.
    pub async fn status(&self) -> Result<(QueueMarker, QueueStatusReport), ClientError> {
        let marker = self
            .store
            .queue_marker()?
            .ok_or_else(|| ClientError::State("There is no buddy queue entry on record".to_string()))?;
        let report = self.backend.queue_status(&marker.queue_id).await?;
        Ok((marker, report))
    }

    /// Starts watching the recorded queue entry. Events arrive on `handler` until a terminal one fires or the
    /// subscription is cancelled. Errors if there is no entry on record.
    pub fn subscribe(&self, handler: Handler<MatchEvent>) -> Result<MatchSubscription, ClientError> {
        self.subscribe_every(handler, TICK_INTERVAL, POLL_INTERVAL)
    }

    /// As [`subscribe`](Self::subscribe), with explicit worker cadences.
    pub fn subscribe_every(
        &self,
        handler: Handler<MatchEvent>,
        tick_interval: StdDuration,
        poll_interval: StdDuration,
    ) -> Result<MatchSubscription, ClientError> {
        let marker = self
            .store
            .queue_marker()?
            .ok_or_else(|| ClientError::State("There is no buddy queue entry to watch".to_string()))?;
        let terminated = Arc::new(AtomicBool::new(false));
        let countdown =
            start_countdown(marker.clone(), self.store.clone(), handler.clone(), terminated.clone(), tick_interval);
        let poller = start_status_poller(
            Arc::clone(&self.backend),
            marker.queue_id.clone(),
            self.store.clone(),
            handler,
            terminated.clone(),
            poll_interval,
        );
        Ok(MatchSubscription {
            queue_id: marker.queue_id,
            terminated,
            countdown: Some(countdown),
            poller: Some(poller),
        })
    }

    /// Gives up on matching and proceeds solo.
    ///
    /// The local marker is cleared immediately and unconditionally. The server-side entry is withdrawn on a
    /// best-effort background task; a failure there only costs the matcher a stale entry, which it expires on its
    /// own.
    pub async fn continue_alone(&self) -> Result<(), ClientError> {
        let marker = self.store.queue_marker()?;
        self.store.clear_queue_marker()?;
        if let Some(marker) = marker {
            let backend = Arc::clone(&self.backend);
            let queue_id = marker.queue_id.clone();
            tokio::spawn(async move {
                if let Err(e) = backend.leave_queue(&queue_id).await {
                    debug!("Best-effort withdrawal of queue entry {queue_id} failed: {e}");
                }
            });
            info!("🚶 Continuing alone. Gave up queue entry {}", marker.queue_id);
        }
        Ok(())
    }
}

//--------------------------------------   MatchSubscription   --------------------------------------

/// A live matching watch. Owns the countdown and poller tasks; dropping it (or calling
/// [`cancel`](Self::cancel)) aborts both.
#[derive(Debug)]
pub struct MatchSubscription {
    queue_id: QueueId,
    terminated: Arc<AtomicBool>,
    countdown: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
}

impl MatchSubscription {
    pub fn queue_id(&self) -> &QueueId {
        &self.queue_id
    }

    /// True once a terminal event has fired or the subscription was cancelled.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Stops both workers without emitting anything. Safe to call more than once.
    pub fn cancel(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        if let Some(handle) = &self.countdown {
            handle.abort();
        }
        if let Some(handle) = &self.poller {
            handle.abort();
        }
    }

    /// Waits for both workers to wind down. Returns immediately on a second call.
    pub async fn wait(&mut self) {
        if let Some(handle) = self.countdown.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("The countdown worker panicked: {e}");
                }
            }
        }
        if let Some(handle) = self.poller.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("The status poller panicked: {e}");
                }
            }
        }
    }
}

impl Drop for MatchSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

//--------------------------------------       Workers       --------------------------------------

fn start_countdown(
    marker: QueueMarker,
    store: StateStore,
    handler: Handler<MatchEvent>,
    terminated: Arc<AtomicBool>,
    interval: StdDuration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        debug!("⏳ Countdown for queue entry {} started at {}s", marker.queue_id, marker.remaining_secs(Utc::now()));
        loop {
            timer.tick().await;
            if terminated.load(Ordering::SeqCst) {
                break;
            }
            let remaining = marker.remaining_secs(Utc::now());
            (handler)(MatchEvent::Tick { remaining_secs: remaining }).await;
            if remaining == 0 {
                if !terminated.swap(true, Ordering::SeqCst) {
                    info!("⏰ The wait for queue entry {} ran out", marker.queue_id);
                    if let Err(e) = store.clear_queue_marker() {
                        error!("Could not clear the queue marker: {e}");
                    }
                    (handler)(MatchEvent::TimedOut).await;
                }
                break;
            }
        }
        trace!("⏳ Countdown for queue entry {} stopped", marker.queue_id);
    })
}

fn start_status_poller<B>(
    backend: Arc<B>,
    queue_id: QueueId,
    store: StateStore,
    handler: Handler<MatchEvent>,
    terminated: Arc<AtomicBool>,
    interval: StdDuration,
) -> JoinHandle<()>
where B: StorefrontBackend + Send + Sync + 'static
{
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let mut failures = 0u32;
        loop {
            timer.tick().await;
            if terminated.load(Ordering::SeqCst) {
                break;
            }
            match backend.queue_status(&queue_id).await {
                Ok(report) => {
                    failures = 0;
                    match report.status {
                        QueueStatus::Waiting => {
                            trace!("🔄️ Queue entry {queue_id} is still waiting");
                            (handler)(MatchEvent::Waiting { nearby_users: report.nearby_users }).await;
                        },
                        QueueStatus::Matched => {
                            let Some(clubbed_order_id) = report.clubbed_order_id else {
                                // A matched report without an order id cannot be acted on. Poll again.
                                warn!("🔄️ The matched report for {queue_id} is missing the clubbed order id");
                                continue;
                            };
                            if !terminated.swap(true, Ordering::SeqCst) {
                                let discount = report.discount_given.unwrap_or_default();
                                info!("🎉 Queue entry {queue_id} matched into clubbed order {clubbed_order_id}");
                                persist_match(&store, clubbed_order_id.clone(), discount);
                                (handler)(MatchEvent::Matched { clubbed_order_id, discount_given: discount }).await;
                            }
                            break;
                        },
                        QueueStatus::TimedOut | QueueStatus::Expired => {
                            if !terminated.swap(true, Ordering::SeqCst) {
                                info!("⏰ Queue entry {queue_id} expired server-side ({})", report.status);
                                if let Err(e) = store.clear_queue_marker() {
                                    error!("Could not clear the queue marker: {e}");
                                }
                                (handler)(MatchEvent::TimedOut).await;
                            }
                            break;
                        },
                    }
                },
                Err(e) if e.is_not_found() => {
                    // The server no longer knows the entry, so the wait can never complete.
                    if !terminated.swap(true, Ordering::SeqCst) {
                        info!("Queue entry {queue_id} no longer exists server-side");
                        if let Err(err) = store.clear_queue_marker() {
                            error!("Could not clear the queue marker: {err}");
                        }
                        (handler)(MatchEvent::TimedOut).await;
                    }
                    break;
                },
                Err(e) if e.is_auth() => {
                    if !terminated.swap(true, Ordering::SeqCst) {
                        error!("🔄️ The status poll for {queue_id} was rejected: {e}");
                        if let Err(err) = store.clear_queue_marker() {
                            error!("Could not clear the queue marker: {err}");
                        }
                        (handler)(MatchEvent::Failed { reason: e.to_string() }).await;
                    }
                    break;
                },
                Err(e) => {
                    failures += 1;
                    warn!("🔄️ Status poll {failures}/{MAX_POLL_FAILURES} for {queue_id} failed: {e}");
                    if failures >= MAX_POLL_FAILURES {
                        if !terminated.swap(true, Ordering::SeqCst) {
                            if let Err(err) = store.clear_queue_marker() {
                                error!("Could not clear the queue marker: {err}");
                            }
                            (handler)(MatchEvent::Failed { reason: e.to_string() }).await;
                        }
                        break;
                    }
                },
            }
        }
        trace!("🔄️ Status poller for queue entry {queue_id} stopped");
    })
}

fn persist_match(store: &StateStore, clubbed_order_id: ClubbedOrderId, discount_given: Rupee) {
    let result = store.update(|state| {
        state.queue = None;
        state.club = Some(ClubMarker { clubbed_order_id, discount_given });
    });
    if let Err(e) = result {
        error!("Could not persist the match outcome: {e}");
    }
}
