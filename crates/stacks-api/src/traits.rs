//! Remote collaborators, as seen by the harness.

use async_trait::async_trait;
use pox_params::types::PoxInfo;

use crate::{
    error::ClientError,
    subscription::FeedHandle,
    types::{
        AccountInfo, AccountNonces, BurnchainReward, Pox4Event, SignedTransaction, TxId, TxRecord,
    },
};

/// Callback invoked for every update a status feed delivers for a subscribed transaction.
pub type UpdateHandler = Box<dyn Fn(TxRecord) + Send + Sync>;

/// Chain tip and reward-cycle parameters.
#[async_trait]
pub trait ChainInfoApi: Send + Sync {
    /// Returns the burn chain height the node has processed.
    async fn burn_block_height(&self) -> Result<u64, ClientError>;

    /// Returns the node's current view of the PoX parameters.
    async fn pox_info(&self) -> Result<PoxInfo, ClientError>;
}

/// Account balances and nonces.
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// Returns the confirmed state of `principal`.
    async fn account_info(&self, principal: &str) -> Result<AccountInfo, ClientError>;

    /// Returns the mempool-aware nonces of `principal`.
    async fn account_nonces(&self, principal: &str) -> Result<AccountNonces, ClientError>;
}

/// Submits transactions to the mempool.
#[async_trait]
pub trait TxBroadcaster: Send + Sync {
    /// Broadcasts `tx` and returns the id the node accepted it under.
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, ClientError>;
}

/// Push notifications about the status of individual transactions.
#[async_trait]
pub trait TxStatusFeed: Send + Sync {
    /// Delivers every update for `tx_id` to `handler` until the returned handle is released.
    async fn subscribe(
        &self,
        tx_id: &TxId,
        handler: UpdateHandler,
    ) -> Result<FeedHandle, ClientError>;
}

/// Read-only views used to verify the outcome of stacking.
#[async_trait]
pub trait RewardsApi: Send + Sync {
    /// Returns the burn chain rewards paid to `address`, newest first.
    async fn burnchain_rewards(&self, address: &str) -> Result<Vec<BurnchainReward>, ClientError>;

    /// Returns the events emitted by the pox-4 contract, newest first.
    async fn pox4_events(&self) -> Result<Vec<Pox4Event>, ClientError>;

    /// Returns the transaction with id `tx_id`, or `None` if the indexer does not know it.
    async fn transaction(&self, tx_id: &TxId) -> Result<Option<TxRecord>, ClientError>;
}
