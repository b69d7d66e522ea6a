//! Records exchanged with the node and the indexer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use thiserror::Error;

use crate::serde_utils::{hex_u128, stringly};

/// Length of a transaction id in bytes.
pub const TX_ID_LEN: usize = 32;

/// Error while parsing a [`TxId`] from text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TxIdParseError {
    /// The text is not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The decoded id has the wrong length.
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

/// A transaction id.
///
/// Displayed as `0x`-prefixed lowercase hex. The prefix is optional when parsing.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId([u8; TX_ID_LEN]);

impl TxId {
    /// Wraps raw id bytes.
    pub const fn from_bytes(bytes: [u8; TX_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw id bytes.
    pub const fn as_bytes(&self) -> &[u8; TX_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({self})")
    }
}

impl FromStr for TxId {
    type Err = TxIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)?;
        let len = bytes.len();
        let bytes: [u8; TX_ID_LEN] = bytes
            .try_into()
            .map_err(|_| TxIdParseError::Length(len))?;
        Ok(Self(bytes))
    }
}

impl Serialize for TxId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A signed, serialized transaction ready to be broadcast.
///
/// The harness never inspects the payload; building and signing transactions happens elsewhere.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    bytes: Vec<u8>,
}

impl SignedTransaction {
    /// Wraps the consensus serialization of a signed transaction.
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Returns the serialized transaction.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the id the chain assigns to this transaction, the SHA-512/256 digest of its
    /// serialization.
    pub fn tx_id(&self) -> TxId {
        TxId(Sha512_256::digest(&self.bytes).into())
    }
}

impl fmt::Debug for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedTransaction")
            .field("tx_id", &self.tx_id())
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Status of a transaction as reported by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxStatus {
    /// Known to the mempool, not yet in a block.
    Pending,

    /// Included in a block and executed successfully.
    Success,

    /// Included in a block but aborted by the contract's response.
    AbortByResponse,

    /// Included in a block but aborted by a post-condition.
    AbortByPostCondition,

    /// Dropped from the mempool or otherwise failed.
    Failed,
}

impl TxStatus {
    /// Returns true for statuses after which the status can no longer change.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }

    /// Returns true if the transaction executed successfully.
    pub const fn is_success(&self) -> bool {
        matches!(self, TxStatus::Success)
    }

    /// Returns true if the transaction was mined but aborted.
    pub const fn is_abort(&self) -> bool {
        matches!(
            self,
            TxStatus::AbortByResponse | TxStatus::AbortByPostCondition
        )
    }

    const fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Success => "success",
            TxStatus::AbortByResponse => "abort_by_response",
            TxStatus::AbortByPostCondition => "abort_by_post_condition",
            TxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TxStatus {
    /// Every status the indexer does not single out (`dropped_replace_by_fee`,
    /// `dropped_stale_garbage_collect`, ...) maps to [`TxStatus::Failed`].
    fn from(s: &str) -> Self {
        match s {
            "pending" => TxStatus::Pending,
            "success" => TxStatus::Success,
            "abort_by_response" => TxStatus::AbortByResponse,
            "abort_by_post_condition" => TxStatus::AbortByPostCondition,
            _ => TxStatus::Failed,
        }
    }
}

impl Serialize for TxStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TxStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TxStatus::from(s.as_str()))
    }
}

/// A transaction as reported by the indexer, either on the status feed or from the transaction
/// endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Transaction id.
    pub tx_id: TxId,

    /// Current status.
    pub tx_status: TxStatus,

    /// Hash of the including block. Present once the transaction is mined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,

    /// Height of the including block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,

    /// Clarity value returned by the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_result: Option<TxResult>,

    /// Kind of transaction, e.g. `contract_call` or `token_transfer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<String>,
}

impl TxRecord {
    /// Returns true once the transaction is part of a block, regardless of how it executed.
    pub const fn is_confirmed(&self) -> bool {
        self.block_hash.is_some()
    }
}

/// Result of executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    /// Hex encoding of the Clarity value.
    pub hex: String,

    /// Human readable representation of the Clarity value, e.g. `(ok true)`.
    pub repr: String,
}

/// Account state from the node's account endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Spendable balance in micro-STX.
    #[serde(with = "hex_u128")]
    pub balance: u128,

    /// Balance locked by stacking in micro-STX.
    #[serde(with = "hex_u128")]
    pub locked: u128,

    /// Burn height at which the locked balance unlocks. Zero if nothing is locked.
    pub unlock_height: u64,

    /// Nonce of the next transaction, counting confirmed transactions only.
    pub nonce: u64,
}

/// Nonce view from the indexer, which also accounts for the mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNonces {
    /// Nonce of the latest transaction in the mempool.
    #[serde(default)]
    pub last_mempool_tx_nonce: Option<u64>,

    /// Nonce of the latest executed transaction.
    #[serde(default)]
    pub last_executed_tx_nonce: Option<u64>,

    /// Nonce that the next transaction should use.
    pub possible_next_nonce: u64,

    /// Nonces below the latest mempool nonce that no transaction uses.
    #[serde(default)]
    pub detected_missing_nonces: Vec<u64>,
}

/// A paged list response from the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Maximum number of results in the page.
    #[serde(default)]
    pub limit: u64,

    /// Offset of the first result.
    #[serde(default)]
    pub offset: u64,

    /// Total number of results across pages.
    #[serde(default)]
    pub total: u64,

    /// Results of this page.
    pub results: Vec<T>,
}

/// A PoX reward paid out on the burn chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnchainReward {
    /// Whether the reward is on the canonical fork.
    pub canonical: bool,

    /// Hash of the burn block the reward was paid in.
    pub burn_block_hash: String,

    /// Height of the burn block the reward was paid in.
    pub burn_block_height: u64,

    /// Amount burnt by the miner, in satoshis.
    #[serde(with = "stringly")]
    pub burn_amount: u128,

    /// Burn chain address of the recipient.
    pub reward_recipient: String,

    /// Amount paid to the recipient, in satoshis.
    #[serde(with = "stringly")]
    pub reward_amount: u128,

    /// Index of the reward slot within the block.
    pub reward_index: u64,
}

/// A print event emitted by the pox-4 contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pox4Event {
    /// Stacks block height of the emitting transaction.
    pub block_height: u64,

    /// Emitting transaction.
    pub tx_id: TxId,

    /// Principal the event is about.
    pub stacker: String,

    /// Function that emitted the event, e.g. `stack-stx` or `delegate-stx`.
    pub name: String,

    /// Reward address in its burn chain encoding.
    #[serde(default)]
    pub pox_addr: Option<String>,

    /// Locked balance of the stacker before the event.
    #[serde(with = "stringly")]
    pub locked: u128,

    /// Unlocked balance of the stacker before the event.
    #[serde(with = "stringly")]
    pub balance: u128,

    /// Burn height at which the stacker's balance unlocks.
    #[serde(with = "stringly")]
    pub burnchain_unlock_height: u64,

    /// Event specific details.
    pub data: Pox4EventData,
}

/// Details of a [`Pox4Event`]. Which fields are present depends on the event name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pox4EventData {
    /// Amount locked by the event.
    #[serde(with = "stringly::option")]
    pub lock_amount: Option<u128>,

    /// Number of cycles locked for.
    #[serde(with = "stringly::option")]
    pub lock_period: Option<u64>,

    /// Burn height at which the lock starts.
    #[serde(with = "stringly::option")]
    pub start_burn_height: Option<u64>,

    /// Burn height at which the lock ends.
    #[serde(with = "stringly::option")]
    pub unlock_burn_height: Option<u64>,

    /// Signer key authorised for the lock.
    pub signer_key: Option<String>,

    /// First reward cycle affected by the event.
    #[serde(with = "stringly::option")]
    pub start_cycle_id: Option<u64>,

    /// Last reward cycle affected by the event, if bounded.
    #[serde(with = "stringly::option")]
    pub end_cycle_id: Option<u64>,
}
