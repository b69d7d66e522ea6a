//! This module implements a system that follows individual transactions on the status feed and
//! resolves once each of them is mined.
//!
//! The feed pushes updates through a callback. The callback is the only producer for a
//! settle-once [`Waiter`], so however many terminal updates arrive, the caller observes exactly one
//! outcome. The subscription is owned by a [`FeedHandle`] that is released exactly once on every
//! exit path: settlement, broadcast failure, deadline or the caller dropping the future.

use std::time::Duration;

use coord::{
    timeout::with_timeout,
    waiter::{waiter, Finisher, Waiter},
};
use parking_lot::Mutex;
use stacks_api::{
    subscription::FeedHandle,
    traits::{TxBroadcaster, TxStatusFeed, UpdateHandler},
    types::{SignedTransaction, TxId, TxRecord},
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{config::HarnessConfig, error::TrackerError};

/// Progress of a tracked transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfirmationState {
    /// Subscribed, no update seen yet.
    #[default]
    Subscribed,

    /// Seen in the mempool.
    Pending,

    /// Mined. No further update changes the outcome.
    Terminal,
}

impl ConfirmationState {
    /// Applies `record` and returns true if it is the update that settles the transaction.
    pub fn observe(&mut self, record: &TxRecord) -> bool {
        match self {
            ConfirmationState::Terminal => false,
            _ if record.is_confirmed() => {
                *self = ConfirmationState::Terminal;
                true
            }
            _ => {
                *self = ConfirmationState::Pending;
                false
            }
        }
    }
}

/// Outcome of tracking a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// The update that settled the transaction.
    pub record: TxRecord,

    /// Time between subscribing and settlement.
    pub elapsed: Duration,
}

impl Confirmation {
    /// Returns the settling record if the transaction executed successfully.
    pub fn expect_success(self) -> Result<TxRecord, TrackerError> {
        if self.record.tx_status.is_success() {
            Ok(self.record)
        } else {
            Err(TrackerError::TxFailed {
                tx_id: self.record.tx_id,
                status: self.record.tx_status,
            })
        }
    }
}

/// Builds the feed callback for `tx_id`: drives the state machine and settles `finisher` once.
fn update_handler(tx_id: TxId, finisher: Finisher<TxRecord>) -> UpdateHandler {
    let state = Mutex::new(ConfirmationState::default());

    Box::new(move |record: TxRecord| {
        let mut state = state.lock();
        if *state == ConfirmationState::Terminal {
            debug!(%tx_id, status = %record.tx_status, "ignoring update for settled transaction");
            return;
        }

        if !state.observe(&record) {
            debug!(%tx_id, status = %record.tx_status, "transaction pending");
            return;
        }

        info!(
            %tx_id,
            status = %record.tx_status,
            height = ?record.block_height,
            "transaction mined"
        );
        if let Err(e) = finisher.finish(record) {
            debug!(%tx_id, %e, "settlement not delivered");
        }
    })
}

/// Follows transactions on a status feed until they are mined.
#[derive(Debug, Clone)]
pub struct TransactionConfirmationTracker<B, F> {
    broadcaster: B,
    feed: F,
    config: HarnessConfig,
}

impl<B: TxBroadcaster, F: TxStatusFeed> TransactionConfirmationTracker<B, F> {
    /// Creates a tracker that submits through `broadcaster` and follows `feed`.
    pub const fn new(broadcaster: B, feed: F, config: HarnessConfig) -> Self {
        Self {
            broadcaster,
            feed,
            config,
        }
    }

    /// Returns the config the tracker was created with.
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    async fn subscribe(
        &self,
        tx_id: &TxId,
    ) -> Result<(FeedHandle, Waiter<TxRecord>), TrackerError> {
        let (finisher, waiter) = waiter();
        let handle = self
            .feed
            .subscribe(tx_id, update_handler(*tx_id, finisher))
            .await?;
        debug!(%tx_id, "tracking transaction");

        Ok((handle, waiter))
    }

    async fn settle(
        &self,
        handle: FeedHandle,
        waiter: Waiter<TxRecord>,
        started: Instant,
    ) -> Result<Confirmation, TrackerError> {
        let tx_id = *handle.tx_id();
        let outcome = match self.config.confirmation_timeout() {
            // On timeout `handle` is dropped on the way out, which releases the subscription.
            Some(deadline) => with_timeout(deadline, waiter).await?,
            None => waiter.await,
        };
        handle.unsubscribe();

        let record = outcome.map_err(|_| TrackerError::FeedClosed(tx_id))?;
        Ok(Confirmation {
            record,
            elapsed: started.elapsed(),
        })
    }

    /// Waits until `tx_id` is mined.
    ///
    /// Bounded by the configured confirmation timeout, if any.
    pub async fn wait_for_transaction(&self, tx_id: &TxId) -> Result<Confirmation, TrackerError> {
        let started = Instant::now();
        let (handle, waiter) = self.subscribe(tx_id).await?;
        self.settle(handle, waiter, started).await
    }

    /// Broadcasts `tx` and waits until it is mined.
    ///
    /// The subscription is opened before the broadcast so that an update arriving right after the
    /// node accepts the transaction cannot be missed. If the node reports a different id, tracking
    /// moves to that id.
    pub async fn broadcast_and_wait_for_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> Result<Confirmation, TrackerError> {
        let tx_id = tx.tx_id();
        let started = Instant::now();
        let (handle, waiter) = self.subscribe(&tx_id).await?;

        let (handle, waiter) = match self.broadcaster.broadcast(tx).await {
            Ok(accepted) if accepted != tx_id => {
                warn!(%tx_id, %accepted, "node accepted the transaction under a different id");
                handle.unsubscribe();
                self.subscribe(&accepted).await?
            }
            Ok(_) => (handle, waiter),
            Err(e) => {
                handle.unsubscribe();
                return Err(e.into());
            }
        };

        self.settle(handle, waiter, started).await
    }
}
