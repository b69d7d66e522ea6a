//! Handles to live status feed subscriptions.

use tracing::debug;

use crate::types::TxId;

/// Owns one subscription on a [`TxStatusFeed`](crate::traits::TxStatusFeed).
///
/// The subscription is released exactly once: either explicitly through
/// [`FeedHandle::unsubscribe`] or implicitly when the handle is dropped. Dropping covers every
/// early exit, including a deadline cancelling the future that holds the handle.
pub struct FeedHandle {
    tx_id: TxId,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl FeedHandle {
    /// Creates a handle that runs `release` once the subscription is given up.
    pub fn new(tx_id: TxId, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            tx_id,
            release: Some(Box::new(release)),
        }
    }

    /// Returns the transaction the subscription is keyed by.
    pub const fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    /// Releases the subscription now.
    pub fn unsubscribe(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(release) = self.release.take() {
            debug!(tx_id = %self.tx_id, "releasing status feed subscription");
            release();
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for FeedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedHandle")
            .field("tx_id", &self.tx_id)
            .field("released", &self.release.is_none())
            .finish()
    }
}
