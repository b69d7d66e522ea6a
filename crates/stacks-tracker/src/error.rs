//! Errors surfaced to callers of the tracker.

use coord::{poll::PollError, timeout::Elapsed};
use pox_params::errors::ParamsError;
use stacks_api::{
    error::ClientError,
    types::{TxId, TxStatus},
};
use thiserror::Error;

/// Error while waiting on chain state.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A remote call failed after exhausting its retry budget.
    #[error("client: {0}")]
    Client(#[from] ClientError),

    /// The operation did not settle before its deadline.
    #[error(transparent)]
    Timeout(#[from] Elapsed),

    /// The status feed went away before the transaction was settled.
    #[error("status feed for {0} closed before the transaction settled")]
    FeedClosed(TxId),

    /// The node reported unusable reward-cycle parameters.
    #[error("params: {0}")]
    Params(#[from] ParamsError),

    /// A bounded wait gave up.
    #[error("condition unmet after {polls} polls")]
    Exhausted {
        /// Number of probes that were made.
        polls: usize,
    },

    /// The account nonce cannot advance any further.
    #[error("nonce {current} cannot advance")]
    NonceOverflow {
        /// The nonce that was to be followed.
        current: u64,
    },

    /// The account has no locked balance.
    #[error("account is not stacking")]
    NotStacked,

    /// The balance does not cover the stacking minimum plus margin.
    #[error("balance {balance} below required {required}")]
    InsufficientBalance {
        /// Available balance in micro-STX.
        balance: u128,

        /// Required balance in micro-STX.
        required: u128,
    },

    /// The transaction was mined but did not execute successfully.
    #[error("transaction {tx_id} settled with status {status}")]
    TxFailed {
        /// The failed transaction.
        tx_id: TxId,

        /// Its final status.
        status: TxStatus,
    },
}

impl<E: Into<TrackerError>> From<PollError<E>> for TrackerError {
    fn from(error: PollError<E>) -> Self {
        match error {
            PollError::Exhausted { polls } => TrackerError::Exhausted { polls },
            PollError::Fetch(e) => e.into(),
        }
    }
}
