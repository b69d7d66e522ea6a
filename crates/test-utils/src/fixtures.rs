//! Canned values for tests.

use pox_params::{
    phase::{CycleParams, PreparePhasePolicy},
    types::{ContractVersion, CurrentCycle, NextCycle, PoxInfo},
};
use stacks_api::types::{AccountInfo, SignedTransaction, TxId, TxRecord, TxStatus};

/// Minimum stacking amount reported by the fixtures, in micro-STX.
pub const MIN_THRESHOLD_USTX: u128 = 583_400_000_000;

/// Builds a [`PoxInfo`] snapshot for the given cycle parameters, taken at burn height `height`.
///
/// The derived fields (cycle ids, next phase heights) are computed the way a node would. The
/// fourth contract version (pox-4) activates at `first + cycle_length`.
///
/// # Panics
///
/// Panics if the cycle parameters are invalid.
pub fn pox_info(first: u64, cycle_length: u64, prepare_length: u64, height: u64) -> PoxInfo {
    let params = CycleParams::new(first, cycle_length, prepare_length)
        .expect("fixture params must be valid");
    let policy = PreparePhasePolicy::Inclusive;
    let cycle = params.burn_height_to_reward_cycle(height).max(0) as u64;
    let prepare_start = params.next_prepare_phase_height(height, policy);
    let reward_start = params.next_reward_phase_height(prepare_start, policy);

    let versions = ["pox", "pox-2", "pox-3", "pox-4"]
        .iter()
        .enumerate()
        .map(|(i, name)| ContractVersion {
            contract_id: format!("ST000000000000000000002AMW42H.{name}"),
            activation_burnchain_block_height: first + (i as u64) * cycle_length / 3,
            first_reward_cycle_id: i as u64 / 3,
        })
        .collect();

    PoxInfo {
        contract_id: "ST000000000000000000002AMW42H.pox-4".to_string(),
        first_burnchain_block_height: first,
        current_burnchain_block_height: Some(height),
        prepare_phase_block_length: prepare_length,
        reward_phase_block_length: cycle_length - prepare_length,
        reward_slots: 2 * (cycle_length - prepare_length),
        reward_cycle_id: cycle,
        reward_cycle_length: cycle_length,
        min_amount_ustx: MIN_THRESHOLD_USTX,
        pox_activation_threshold_ustx: 700_073_322_473_389,
        current_cycle: CurrentCycle {
            id: cycle,
            min_threshold_ustx: MIN_THRESHOLD_USTX,
            stacked_ustx: 0,
            is_pox_active: false,
        },
        next_cycle: NextCycle {
            id: cycle + 1,
            min_threshold_ustx: MIN_THRESHOLD_USTX,
            stacked_ustx: 0,
            prepare_phase_start_block_height: prepare_start,
            blocks_until_prepare_phase: prepare_start as i64 - height as i64,
            reward_phase_start_block_height: reward_start,
            blocks_until_reward_phase: reward_start.saturating_sub(height),
        },
        contract_versions: versions,
    }
}

/// Returns a transaction id whose bytes are all `n`.
pub const fn tx_id(n: u8) -> TxId {
    TxId::from_bytes([n; 32])
}

/// Returns a distinct dummy signed transaction for every `n`.
pub fn signed_tx(n: u8) -> SignedTransaction {
    SignedTransaction::new(vec![0x80, 0x80, n])
}

/// Returns a mempool update for `tx_id`.
pub const fn pending(tx_id: TxId) -> TxRecord {
    TxRecord {
        tx_id,
        tx_status: TxStatus::Pending,
        block_hash: None,
        block_height: None,
        tx_result: None,
        tx_type: None,
    }
}

/// Returns an update for `tx_id` mined at `height` with `status`.
pub fn confirmed(tx_id: TxId, status: TxStatus, height: u64) -> TxRecord {
    TxRecord {
        tx_id,
        tx_status: status,
        block_hash: Some(format!("0x{height:064x}")),
        block_height: Some(height),
        tx_result: None,
        tx_type: None,
    }
}

/// Returns an account state.
pub const fn account(balance: u128, locked: u128, unlock_height: u64, nonce: u64) -> AccountInfo {
    AccountInfo {
        balance,
        locked,
        unlock_height,
        nonce,
    }
}
