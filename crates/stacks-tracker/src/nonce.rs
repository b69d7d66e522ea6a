//! Nonce reads and sequencing.

use coord::{
    poll::{wait_until, wait_until_bounded},
    predicate,
    retry::retry_with,
};
use serde::{Deserialize, Serialize};
use stacks_api::{error::ClientError, traits::AccountApi};
use tracing::debug;

use crate::{config::HarnessConfig, error::TrackerError};

/// Where the next nonce of an account is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceSource {
    /// The node's account endpoint. Only counts confirmed transactions.
    #[default]
    Confirmed,

    /// The indexer's nonce endpoint. Also counts transactions still in the mempool.
    Mempool,
}

/// Reads the nonce of one account and waits for it to advance.
#[derive(Debug, Clone)]
pub struct NonceSequencer<A> {
    api: A,
    principal: String,
    config: HarnessConfig,
}

impl<A: AccountApi> NonceSequencer<A> {
    /// Creates a sequencer for `principal`.
    pub fn new(api: A, principal: impl Into<String>, config: HarnessConfig) -> Self {
        Self {
            api,
            principal: principal.into(),
            config,
        }
    }

    /// Returns the account this sequencer reads.
    pub fn principal(&self) -> &str {
        &self.principal
    }

    async fn read(&self, source: NonceSource) -> Result<u64, ClientError> {
        match source {
            NonceSource::Confirmed => Ok(self.api.account_info(&self.principal).await?.nonce),
            NonceSource::Mempool => Ok(self
                .api
                .account_nonces(&self.principal)
                .await?
                .possible_next_nonce),
        }
    }

    /// Returns the nonce the next transaction of the account should use, as seen by `source`.
    pub async fn next_nonce(&self, source: NonceSource) -> Result<u64, TrackerError> {
        let strategy = self.config.retry_strategy();
        Ok(retry_with(strategy, move || self.read(source)).await?)
    }

    /// Polls the configured source until the next nonce is exactly `current + 1`.
    ///
    /// A nonce that skips past `current + 1` between two polls, because several transactions
    /// confirmed in between, is never matched and the wait does not end. Bound the wait with a
    /// deadline or use [`NonceSequencer::wait_for_next_nonce_bounded`] where that can happen.
    pub async fn wait_for_next_nonce(&self, current: u64) -> Result<u64, TrackerError> {
        let source = self.config.nonce_source;
        let next = successor(current)?;
        debug!(principal = %self.principal, current, "waiting for nonce to advance");
        wait_until(
            move || self.next_nonce(source),
            predicate::eq(next),
            self.config.poll_interval(),
        )
        .await
    }

    /// Like [`NonceSequencer::wait_for_next_nonce`] but gives up after `max_polls` polls.
    pub async fn wait_for_next_nonce_bounded(
        &self,
        current: u64,
        max_polls: usize,
    ) -> Result<u64, TrackerError> {
        let source = self.config.nonce_source;
        let next = successor(current)?;
        Ok(wait_until_bounded(
            move || self.next_nonce(source),
            predicate::eq(next),
            self.config.poll_interval(),
            max_polls,
        )
        .await?)
    }
}

fn successor(current: u64) -> Result<u64, TrackerError> {
    current
        .checked_add(1)
        .ok_or(TrackerError::NonceOverflow { current })
}

/// Hands out consecutive nonces for a run of transactions sent without waiting in between.
///
/// The counter is owned by the caller and is the only state shared across concurrent sends, so
/// every nonce is claimed before the corresponding send starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceCounter {
    next: u64,
}

impl NonceCounter {
    /// Creates a counter whose first claim returns `next`.
    pub const fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Returns the nonce the next claim will return.
    pub const fn peek(&self) -> u64 {
        self.next
    }

    /// Claims the next nonce.
    pub fn claim(&mut self) -> u64 {
        let nonce = self.next;
        self.next += 1;
        nonce
    }

    /// Claims the next `n` nonces.
    pub fn claim_many(&mut self, n: usize) -> Vec<u64> {
        (0..n).map(|_| self.claim()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pox_harness_test_utils::prelude::*;

    use super::*;

    const PRINCIPAL: &str = "ST2NEB84ASENDXKYGJPQW86YXQCEFEX2ZQPG87ND";

    fn sequencer(node: &MockStacksNode) -> NonceSequencer<MockStacksNode> {
        let config = HarnessConfig::default().with_poll_interval(Duration::from_millis(100));
        NonceSequencer::new(node.clone(), PRINCIPAL, config)
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_on_exact_increment() {
        let node = MockStacksNode::new();
        node.script_confirmed_nonces([5, 5, 6]);

        let nonce = sequencer(&node)
            .wait_for_next_nonce(5)
            .await
            .expect("must resolve");

        assert_eq!(nonce, 6);
        assert_eq!(node.calls().account_info, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn skipped_nonce_never_matches() {
        let node = MockStacksNode::new();
        node.script_confirmed_nonces([5, 7]);

        let result = sequencer(&node).wait_for_next_nonce_bounded(5, 20).await;

        assert!(matches!(result, Err(TrackerError::Exhausted { polls: 20 })));
        assert_eq!(node.calls().account_info, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn mempool_source_reads_indexer() {
        let node = MockStacksNode::new();
        node.script_mempool_nonces([9]);

        let nonce = sequencer(&node)
            .next_nonce(NonceSource::Mempool)
            .await
            .expect("must read");

        assert_eq!(nonce, 9);
        assert_eq!(node.calls().account_nonces, 1);
        assert_eq!(node.calls().account_info, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reads_ride_out_bad_gateways() {
        let node = MockStacksNode::new();
        node.script_confirmed_nonces([3])
            .fail_next(10, Failure::BadGateway);

        let nonce = sequencer(&node)
            .next_nonce(NonceSource::Confirmed)
            .await
            .expect("transient failures are retried");

        assert_eq!(nonce, 3);
        assert_eq!(node.calls().account_info, 11);
    }

    #[tokio::test(start_paused = true)]
    async fn counted_failures_surface_after_budget() {
        let node = MockStacksNode::new();
        node.script_confirmed_nonces([3])
            .fail_next(4, Failure::Status(500));

        let result = sequencer(&node).next_nonce(NonceSource::Confirmed).await;

        assert!(matches!(
            result,
            Err(TrackerError::Client(ClientError::Status { code: 500, .. }))
        ));
        // One initial attempt plus three retries.
        assert_eq!(node.calls().account_info, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn last_nonce_cannot_advance() {
        let node = MockStacksNode::new();
        node.script_confirmed_nonces([u64::MAX]);

        let result = sequencer(&node).wait_for_next_nonce(u64::MAX).await;

        assert!(matches!(
            result,
            Err(TrackerError::NonceOverflow { current: u64::MAX })
        ));
        assert_eq!(node.calls().account_info, 0);
    }

    #[test]
    fn counter_hands_out_consecutive_nonces() {
        let mut counter = NonceCounter::starting_at(12);

        assert_eq!(counter.claim(), 12);
        assert_eq!(counter.claim_many(3), vec![13, 14, 15]);
        assert_eq!(counter.peek(), 16);
    }
}
