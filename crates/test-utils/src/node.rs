//! An in-memory stand-in for the node and the indexer's HTTP API.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use pox_params::types::PoxInfo;
use stacks_api::{
    error::ClientError,
    traits::{AccountApi, ChainInfoApi, RewardsApi, TxBroadcaster},
    types::{
        AccountInfo, AccountNonces, BurnchainReward, Pox4Event, SignedTransaction, TxId, TxRecord,
    },
};

/// A failure the mock can be told to return instead of answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// HTTP 502, classified as transient.
    BadGateway,

    /// Any other unexpected status code.
    Status(u16),

    /// HTTP 404.
    NotFound,
}

impl From<Failure> for ClientError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::BadGateway => ClientError::BadGateway,
            Failure::Status(code) => ClientError::Status {
                code,
                body: String::new(),
            },
            Failure::NotFound => ClientError::NotFound,
        }
    }
}

/// Replays a sequence of values, repeating the last one once the sequence runs out.
#[derive(Debug)]
struct Script<T> {
    values: VecDeque<T>,
    last: Option<T>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            values: VecDeque::new(),
            last: None,
        }
    }
}

impl<T: Clone> Script<T> {
    fn extend(&mut self, values: impl IntoIterator<Item = T>) {
        self.values.extend(values);
    }

    fn next(&mut self) -> Option<T> {
        if let Some(value) = self.values.pop_front() {
            self.last = Some(value.clone());
        }
        self.last.clone()
    }
}

/// Number of calls made against each endpoint, failed calls included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Calls {
    /// Calls to [`ChainInfoApi::burn_block_height`].
    pub burn_block_height: usize,

    /// Calls to [`ChainInfoApi::pox_info`].
    pub pox_info: usize,

    /// Calls to [`AccountApi::account_info`].
    pub account_info: usize,

    /// Calls to [`AccountApi::account_nonces`].
    pub account_nonces: usize,

    /// Calls to [`TxBroadcaster::broadcast`].
    pub broadcast: usize,
}

#[derive(Debug, Default)]
struct NodeState {
    heights: Script<u64>,
    confirmed_nonces: Script<u64>,
    mempool_nonces: Script<u64>,
    pox_info: Script<PoxInfo>,
    account: Option<AccountInfo>,
    failures: VecDeque<Failure>,
    broadcasts: Vec<SignedTransaction>,
    accepted_ids: VecDeque<TxId>,
    rewards: HashMap<String, Vec<BurnchainReward>>,
    events: Vec<Pox4Event>,
    transactions: HashMap<TxId, TxRecord>,
    calls: Calls,
}

impl NodeState {
    /// Pops the next injected failure, if any.
    fn fail(&mut self) -> Result<(), ClientError> {
        match self.failures.pop_front() {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }
}

/// Scripted node.
///
/// Unscripted reads answer [`ClientError::NotFound`]. Injected failures are consumed by the next
/// calls in order, whichever endpoint they hit.
#[derive(Debug, Clone, Default)]
pub struct MockStacksNode {
    state: Arc<Mutex<NodeState>>,
}

impl MockStacksNode {
    /// Creates a node with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends burn heights to be reported by successive calls.
    pub fn script_heights(&self, heights: impl IntoIterator<Item = u64>) -> &Self {
        self.state.lock().heights.extend(heights);
        self
    }

    /// Appends confirmed nonces to be reported by successive account reads.
    pub fn script_confirmed_nonces(&self, nonces: impl IntoIterator<Item = u64>) -> &Self {
        self.state.lock().confirmed_nonces.extend(nonces);
        self
    }

    /// Appends mempool-aware nonces to be reported by successive nonce reads.
    pub fn script_mempool_nonces(&self, nonces: impl IntoIterator<Item = u64>) -> &Self {
        self.state.lock().mempool_nonces.extend(nonces);
        self
    }

    /// Appends PoX snapshots to be reported by successive calls.
    pub fn script_pox_info(&self, infos: impl IntoIterator<Item = PoxInfo>) -> &Self {
        self.state.lock().pox_info.extend(infos);
        self
    }

    /// Sets the account state. Scripted confirmed nonces override its nonce.
    pub fn set_account(&self, account: AccountInfo) -> &Self {
        self.state.lock().account = Some(account);
        self
    }

    /// Makes the next `n` calls fail with `failure`.
    pub fn fail_next(&self, n: usize, failure: Failure) -> &Self {
        self.state
            .lock()
            .failures
            .extend(std::iter::repeat(failure).take(n));
        self
    }

    /// Makes the next broadcast report `tx_id` as the accepted id instead of the transaction's own.
    pub fn accept_next_as(&self, tx_id: TxId) -> &Self {
        self.state.lock().accepted_ids.push_back(tx_id);
        self
    }

    /// Records a burn chain reward for `address`.
    pub fn add_reward(&self, address: &str, reward: BurnchainReward) -> &Self {
        self.state
            .lock()
            .rewards
            .entry(address.to_string())
            .or_default()
            .push(reward);
        self
    }

    /// Records a pox-4 event.
    pub fn add_event(&self, event: Pox4Event) -> &Self {
        self.state.lock().events.push(event);
        self
    }

    /// Records a transaction known to the indexer.
    pub fn add_transaction(&self, record: TxRecord) -> &Self {
        self.state.lock().transactions.insert(record.tx_id, record);
        self
    }

    /// Returns the number of calls made so far.
    pub fn calls(&self) -> Calls {
        self.state.lock().calls
    }

    /// Returns every transaction broadcast so far, in order.
    pub fn broadcasts(&self) -> Vec<SignedTransaction> {
        self.state.lock().broadcasts.clone()
    }
}

#[async_trait]
impl ChainInfoApi for MockStacksNode {
    async fn burn_block_height(&self) -> Result<u64, ClientError> {
        let mut state = self.state.lock();
        state.calls.burn_block_height += 1;
        state.fail()?;
        state.heights.next().ok_or(ClientError::NotFound)
    }

    async fn pox_info(&self) -> Result<PoxInfo, ClientError> {
        let mut state = self.state.lock();
        state.calls.pox_info += 1;
        state.fail()?;
        state.pox_info.next().ok_or(ClientError::NotFound)
    }
}

#[async_trait]
impl AccountApi for MockStacksNode {
    async fn account_info(&self, _principal: &str) -> Result<AccountInfo, ClientError> {
        let mut state = self.state.lock();
        state.calls.account_info += 1;
        state.fail()?;

        let nonce = state.confirmed_nonces.next();
        match (state.account, nonce) {
            (Some(account), Some(nonce)) => Ok(AccountInfo { nonce, ..account }),
            (Some(account), None) => Ok(account),
            (None, Some(nonce)) => Ok(AccountInfo {
                balance: 0,
                locked: 0,
                unlock_height: 0,
                nonce,
            }),
            (None, None) => Err(ClientError::NotFound),
        }
    }

    async fn account_nonces(&self, _principal: &str) -> Result<AccountNonces, ClientError> {
        let mut state = self.state.lock();
        state.calls.account_nonces += 1;
        state.fail()?;

        let next = state.mempool_nonces.next().ok_or(ClientError::NotFound)?;
        Ok(AccountNonces {
            last_mempool_tx_nonce: next.checked_sub(1),
            last_executed_tx_nonce: None,
            possible_next_nonce: next,
            detected_missing_nonces: Vec::new(),
        })
    }
}

#[async_trait]
impl TxBroadcaster for MockStacksNode {
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, ClientError> {
        let mut state = self.state.lock();
        state.calls.broadcast += 1;
        state.fail()?;

        state.broadcasts.push(tx.clone());
        Ok(state.accepted_ids.pop_front().unwrap_or_else(|| tx.tx_id()))
    }
}

#[async_trait]
impl RewardsApi for MockStacksNode {
    async fn burnchain_rewards(&self, address: &str) -> Result<Vec<BurnchainReward>, ClientError> {
        let mut state = self.state.lock();
        state.fail()?;
        Ok(state.rewards.get(address).cloned().unwrap_or_default())
    }

    async fn pox4_events(&self) -> Result<Vec<Pox4Event>, ClientError> {
        let mut state = self.state.lock();
        state.fail()?;
        Ok(state.events.clone())
    }

    async fn transaction(&self, tx_id: &TxId) -> Result<Option<TxRecord>, ClientError> {
        let mut state = self.state.lock();
        state.fail()?;
        Ok(state.transactions.get(tx_id).cloned())
    }
}
