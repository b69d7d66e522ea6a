//! Types for the reward-cycle parameters reported by a node's `/v2/pox` endpoint.

use serde::{Deserialize, Serialize};

use crate::{
    errors::ParamsError,
    phase::{CycleParams, PhaseClassification, PreparePhasePolicy},
};

/// Snapshot of the node's PoX state.
///
/// Only valid for the burn height it was fetched at
/// ([`PoxInfo::current_burnchain_block_height`]); re-fetch it to observe progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoxInfo {
    /// Fully qualified id of the active PoX contract.
    pub contract_id: String,

    /// Burn height of the first block of reward cycle 0.
    pub first_burnchain_block_height: u64,

    /// Burn height the snapshot was taken at. Older nodes omit it.
    #[serde(default)]
    pub current_burnchain_block_height: Option<u64>,

    /// Number of burn blocks in the prepare phase.
    pub prepare_phase_block_length: u64,

    /// Number of burn blocks in the reward phase.
    pub reward_phase_block_length: u64,

    /// Number of reward slots per cycle.
    #[serde(default)]
    pub reward_slots: u64,

    /// Reward cycle the snapshot was taken in.
    pub reward_cycle_id: u64,

    /// Number of burn blocks in a reward cycle.
    pub reward_cycle_length: u64,

    /// Minimum amount of micro-STX that can be stacked.
    pub min_amount_ustx: u128,

    /// Liquid supply fraction that must be stacked for PoX to activate.
    #[serde(default)]
    pub pox_activation_threshold_ustx: u128,

    /// Summary of the current reward cycle.
    pub current_cycle: CurrentCycle,

    /// Summary of the next reward cycle.
    pub next_cycle: NextCycle,

    /// Every PoX contract version the node knows about, oldest first.
    #[serde(default)]
    pub contract_versions: Vec<ContractVersion>,
}

/// Summary of the current reward cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCycle {
    /// Reward cycle id.
    pub id: u64,

    /// Minimum amount of micro-STX needed for one reward slot.
    pub min_threshold_ustx: u128,

    /// Total micro-STX stacked for the cycle.
    pub stacked_ustx: u128,

    /// Whether PoX is active for the cycle.
    pub is_pox_active: bool,
}

/// Summary of the next reward cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextCycle {
    /// Reward cycle id.
    pub id: u64,

    /// Minimum amount of micro-STX needed for one reward slot.
    pub min_threshold_ustx: u128,

    /// Total micro-STX stacked for the cycle so far.
    pub stacked_ustx: u128,

    /// Burn height at which the prepare phase for the cycle starts.
    #[serde(default)]
    pub prepare_phase_start_block_height: u64,

    /// Blocks until the prepare phase starts. Negative once it has started.
    #[serde(default)]
    pub blocks_until_prepare_phase: i64,

    /// Burn height at which the cycle's reward phase starts.
    #[serde(default)]
    pub reward_phase_start_block_height: u64,

    /// Blocks until the cycle's reward phase starts.
    #[serde(default)]
    pub blocks_until_reward_phase: u64,
}

/// A PoX contract version and the burn height it activated at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractVersion {
    /// Fully qualified contract id.
    pub contract_id: String,

    /// Burn height from which the contract is in force.
    pub activation_burnchain_block_height: u64,

    /// First reward cycle governed by the contract.
    pub first_reward_cycle_id: u64,
}

impl PoxInfo {
    /// Returns the validated cycle parameters of this snapshot.
    pub const fn cycle_params(&self) -> Result<CycleParams, ParamsError> {
        CycleParams::new(
            self.first_burnchain_block_height,
            self.reward_cycle_length,
            self.prepare_phase_block_length,
        )
    }

    /// Returns the burn height the snapshot was taken at.
    pub const fn current_height(&self) -> Result<u64, ParamsError> {
        match self.current_burnchain_block_height {
            Some(height) => Ok(height),
            None => Err(ParamsError::MissingCurrentHeight),
        }
    }

    /// Classifies the burn height the snapshot was taken at.
    pub fn classify_current(
        &self,
        policy: PreparePhasePolicy,
    ) -> Result<PhaseClassification, ParamsError> {
        Ok(self.cycle_params()?.classify(self.current_height()?, policy))
    }

    /// Returns the activation burn height of the contract version at `index`.
    pub fn activation_height(&self, index: usize) -> Result<u64, ParamsError> {
        self.contract_versions
            .get(index)
            .map(|v| v.activation_burnchain_block_height)
            .ok_or(ParamsError::UnknownContractVersion(index))
    }
}

impl TryFrom<&PoxInfo> for CycleParams {
    type Error = ParamsError;

    fn try_from(info: &PoxInfo) -> Result<Self, Self::Error> {
        info.cycle_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::POX_4_VERSION_INDEX, phase::Phase};

    const POX_JSON: &str = r#"{
        "contract_id": "ST000000000000000000002AMW42H.pox-4",
        "pox_activation_threshold_ustx": 700073322473389,
        "first_burnchain_block_height": 0,
        "current_burnchain_block_height": 206,
        "prepare_phase_block_length": 5,
        "reward_phase_block_length": 15,
        "reward_slots": 30,
        "rejection_fraction": null,
        "total_liquid_supply_ustx": 70007332247338910,
        "current_cycle": {
            "id": 10,
            "min_threshold_ustx": 583400000000,
            "stacked_ustx": 0,
            "is_pox_active": false
        },
        "next_cycle": {
            "id": 11,
            "min_threshold_ustx": 583400000000,
            "min_increment_ustx": 875091530591,
            "stacked_ustx": 1750000000000,
            "prepare_phase_start_block_height": 215,
            "blocks_until_prepare_phase": 9,
            "reward_phase_start_block_height": 220,
            "blocks_until_reward_phase": 14,
            "ustx_until_pox_rejection": null
        },
        "epochs": [],
        "min_amount_ustx": 583400000000,
        "prepare_cycle_length": 5,
        "reward_cycle_id": 10,
        "reward_cycle_length": 20,
        "rejection_votes_left_required": null,
        "next_reward_cycle_in": 14,
        "contract_versions": [
            { "contract_id": "ST000000000000000000002AMW42H.pox", "activation_burnchain_block_height": 0, "first_reward_cycle_id": 0 },
            { "contract_id": "ST000000000000000000002AMW42H.pox-2", "activation_burnchain_block_height": 104, "first_reward_cycle_id": 6 },
            { "contract_id": "ST000000000000000000002AMW42H.pox-3", "activation_burnchain_block_height": 108, "first_reward_cycle_id": 6 },
            { "contract_id": "ST000000000000000000002AMW42H.pox-4", "activation_burnchain_block_height": 111, "first_reward_cycle_id": 6 }
        ]
    }"#;

    #[test]
    fn decodes_node_snapshot() {
        let info: PoxInfo = serde_json::from_str(POX_JSON).expect("must decode");

        assert_eq!(info.reward_cycle_length, 20);
        assert_eq!(info.current_height(), Ok(206));
        assert_eq!(info.next_cycle.blocks_until_prepare_phase, 9);
        assert_eq!(info.activation_height(POX_4_VERSION_INDEX), Ok(111));
        assert_eq!(
            info.activation_height(7),
            Err(ParamsError::UnknownContractVersion(7))
        );
    }

    #[test]
    fn snapshot_classification_agrees_with_node_countdown() {
        let info: PoxInfo = serde_json::from_str(POX_JSON).expect("must decode");
        let params = info.cycle_params().expect("valid params");
        let height = info.current_height().expect("height present");

        let class = info
            .classify_current(PreparePhasePolicy::Inclusive)
            .expect("classifiable");
        assert_eq!(class.phase, Phase::Reward);
        assert_eq!(class.cycle, info.reward_cycle_id as i64);

        assert_eq!(
            params.next_prepare_phase_height(height, PreparePhasePolicy::Inclusive),
            info.next_cycle.prepare_phase_start_block_height
        );
        assert_eq!(
            params.blocks_until_reward_phase(
                info.next_cycle.prepare_phase_start_block_height,
                PreparePhasePolicy::Inclusive
            ),
            5
        );
    }

    #[test]
    fn missing_current_height_is_reported() {
        let mut info: PoxInfo = serde_json::from_str(POX_JSON).expect("must decode");
        info.current_burnchain_block_height = None;

        assert_eq!(
            info.classify_current(PreparePhasePolicy::Inclusive),
            Err(ParamsError::MissingCurrentHeight)
        );
    }
}
