//! Broadcasting many transactions without overrunning the mempool's chaining limit.

use coord::chunk::take_chunk;
use futures::future::join_all;
use stacks_api::{
    traits::{TxBroadcaster, TxStatusFeed},
    types::SignedTransaction,
};
use tracing::debug;

use crate::{
    error::TrackerError,
    tracker::{Confirmation, TransactionConfirmationTracker},
};

/// Maximum number of unconfirmed transactions from one sender the mempool accepts.
pub const MAX_MEMPOOL_TX_CHAINING: usize = 25;

/// Broadcasts `txs` in chunks of at most `chunk_size`, waiting for every transaction of a chunk to
/// be mined before starting the next.
///
/// Transactions within a chunk are broadcast and tracked concurrently. Results are returned in
/// submission order; a failed transaction does not stop the remaining ones. A `chunk_size` of zero
/// is treated as one.
pub async fn broadcast_in_chunks<B, F>(
    tracker: &TransactionConfirmationTracker<B, F>,
    txs: Vec<SignedTransaction>,
    chunk_size: usize,
) -> Vec<Result<Confirmation, TrackerError>>
where
    B: TxBroadcaster,
    F: TxStatusFeed,
{
    let chunk_size = chunk_size.max(1);
    let mut results = Vec::with_capacity(txs.len());
    let mut remaining = txs;

    while !remaining.is_empty() {
        let (chunk, rest) = take_chunk(remaining, chunk_size);
        remaining = rest;

        debug!(size = chunk.len(), left = remaining.len(), "submitting chunk");
        let confirmations = join_all(
            chunk
                .iter()
                .map(|tx| tracker.broadcast_and_wait_for_transaction(tx)),
        )
        .await;
        results.extend(confirmations);
    }

    results
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pox_harness_test_utils::prelude::*;
    use stacks_api::types::TxStatus;

    use super::*;
    use crate::config::HarnessConfig;

    #[tokio::test(start_paused = true)]
    async fn chunks_wait_for_each_other_and_keep_order() {
        let node = MockStacksNode::new();
        let feed = ScriptedFeed::new().with_step(Duration::from_millis(10));
        let txs = (0..5).map(signed_tx).collect::<Vec<_>>();
        for (i, tx) in txs.iter().enumerate() {
            feed.script(tx.tx_id(), [confirmed(tx.tx_id(), TxStatus::Success, i as u64)]);
        }
        let tracker = TransactionConfirmationTracker::new(
            node.clone(),
            feed.clone(),
            HarnessConfig::default(),
        );

        let results = broadcast_in_chunks(&tracker, txs.clone(), 2).await;

        let heights = results
            .into_iter()
            .map(|r| r.expect("must confirm").record.block_height)
            .collect::<Vec<_>>();
        assert_eq!(heights, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(node.broadcasts(), txs);
        assert_eq!(feed.unsubscriptions(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_batch() {
        let node = MockStacksNode::new();
        node.fail_next(1, Failure::Status(400));
        let feed = ScriptedFeed::new();
        let txs = (0..3).map(signed_tx).collect::<Vec<_>>();
        for tx in &txs {
            feed.script(tx.tx_id(), [confirmed(tx.tx_id(), TxStatus::Success, 1)]);
        }
        let tracker =
            TransactionConfirmationTracker::new(node.clone(), feed, HarnessConfig::default());

        let results = broadcast_in_chunks(&tracker, txs, 0).await;

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0], Err(TrackerError::Client(_))));
        assert!(results[1].is_ok());
        assert!(results[2].is_ok());
        assert_eq!(node.broadcasts().len(), 2);
    }
}
