//! Reward-cycle and phase arithmetic.
//!
//! Burn heights are classified relative to `first_burnchain_block_height`:
//!
//! ```text
//! pos = (height - first) mod reward_cycle_length
//! ```
//!
//! Whether a given `pos` belongs to the prepare phase has historically been answered in more than
//! one way, and the chain's own reward-set computation has not been pinned down against any of
//! them. The answer is therefore an explicit [`PreparePhasePolicy`] chosen by the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ParamsError;

/// Definition of which burn heights belong to the prepare phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreparePhasePolicy {
    /// `cycle_length - pos <= prepare_length`.
    ///
    /// The last `prepare_length` blocks of a cycle, so the first block of the prepare window is
    /// already prepare phase. This is the definition the regtest environment uses.
    #[default]
    Inclusive,

    /// `cycle_length - pos < prepare_length`.
    ///
    /// One block shorter than [`PreparePhasePolicy::Inclusive`]: the first block of the window is
    /// still reward phase.
    Exclusive,

    /// `height > first && (pos == 0 || pos > cycle_length - prepare_length)`.
    ///
    /// The window shifted right by one block, so it ends on the first block of the next cycle.
    /// This is the definition the node uses internally and the one the neglected phase is built
    /// on.
    ShiftedByOne,
}

/// Top-level phase of a burn height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Stacked funds are earning rewards and new commitments still make the next reward set.
    Reward,

    /// The next cycle's reward set is being finalized.
    Prepare,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Reward => write!(f, "reward phase"),
            Phase::Prepare => write!(f, "prepare phase"),
        }
    }
}

/// Full classification of a burn height.
///
/// `phase` is exclusive at the top level. `neglected` is computed independently and can be set
/// on a height that `phase` reports as [`Phase::Reward`]: the first block of every cycle is both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhaseClassification {
    /// Reward cycle the height belongs to.
    pub cycle: i64,

    /// Phase under the policy the classification was made with.
    pub phase: Phase,

    /// Whether new stacking commitments made at this height miss the upcoming reward set.
    pub neglected: bool,
}

impl PhaseClassification {
    /// Returns true if the height is in the prepare phase.
    pub const fn is_prepare(&self) -> bool {
        matches!(self.phase, Phase::Prepare)
    }
}

/// The validated subset of [`PoxInfo`](crate::types::PoxInfo) needed for phase arithmetic.
///
/// Deserialization goes through [`CycleParams::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCycleParams")]
pub struct CycleParams {
    first: u64,
    cycle_length: u64,
    prepare_length: u64,
}

#[derive(Deserialize)]
struct RawCycleParams {
    first: u64,
    cycle_length: u64,
    prepare_length: u64,
}

impl TryFrom<RawCycleParams> for CycleParams {
    type Error = ParamsError;

    fn try_from(raw: RawCycleParams) -> Result<Self, Self::Error> {
        Self::new(raw.first, raw.cycle_length, raw.prepare_length)
    }
}

impl CycleParams {
    /// Validates and creates a new set of cycle parameters.
    pub const fn new(
        first: u64,
        cycle_length: u64,
        prepare_length: u64,
    ) -> Result<Self, ParamsError> {
        if cycle_length == 0 {
            return Err(ParamsError::ZeroCycleLength);
        }
        if prepare_length == 0 || prepare_length >= cycle_length {
            return Err(ParamsError::InvalidPrepareLength {
                prepare: prepare_length,
                cycle: cycle_length,
            });
        }

        Ok(Self {
            first,
            cycle_length,
            prepare_length,
        })
    }

    /// Burn height of the first block of reward cycle 0.
    pub const fn first(&self) -> u64 {
        self.first
    }

    /// Number of burn blocks in a reward cycle.
    pub const fn cycle_length(&self) -> u64 {
        self.cycle_length
    }

    /// Number of burn blocks in the prepare phase.
    pub const fn prepare_length(&self) -> u64 {
        self.prepare_length
    }

    /// Number of burn blocks in the reward phase.
    pub const fn reward_length(&self) -> u64 {
        self.cycle_length - self.prepare_length
    }

    fn effective(&self, height: u64) -> i128 {
        height as i128 - self.first as i128
    }

    /// Position of `height` within its reward cycle, in `0..cycle_length`.
    pub fn cycle_position(&self, height: u64) -> u64 {
        self.effective(height).rem_euclid(self.cycle_length as i128) as u64
    }

    /// `floor((height - first) / cycle_length)`.
    ///
    /// Negative for heights below `first`, which callers must treat as "cycle not started".
    pub fn burn_height_to_reward_cycle(&self, height: u64) -> i64 {
        self.effective(height).div_euclid(self.cycle_length as i128) as i64
    }

    /// `first + cycle * cycle_length`, the first burn height of `cycle`.
    pub const fn reward_cycle_to_burn_height(&self, cycle: u64) -> u64 {
        self.first.saturating_add(cycle.saturating_mul(self.cycle_length))
    }

    /// Whether `height` is in the prepare phase under `policy`.
    pub fn is_in_prepare_phase(&self, height: u64, policy: PreparePhasePolicy) -> bool {
        let pos = self.cycle_position(height);
        match policy {
            PreparePhasePolicy::Inclusive => self.cycle_length - pos <= self.prepare_length,
            PreparePhasePolicy::Exclusive => self.cycle_length - pos < self.prepare_length,
            PreparePhasePolicy::ShiftedByOne => {
                height > self.first && (pos == 0 || pos > self.reward_length())
            }
        }
    }

    /// Whether a stacking commitment made at `height` misses the upcoming reward set.
    ///
    /// The first block of the prepare window is *not* neglected, every later block of the window
    /// is, and so is the first block of the following cycle. That last block is reward phase under
    /// [`PreparePhasePolicy::Inclusive`], so the two flags overlap there.
    pub fn is_in_neglected_phase(&self, height: u64) -> bool {
        self.is_in_prepare_phase(height, PreparePhasePolicy::ShiftedByOne)
    }

    /// Classifies `height` under `policy`.
    pub fn classify(&self, height: u64, policy: PreparePhasePolicy) -> PhaseClassification {
        let phase = if self.is_in_prepare_phase(height, policy) {
            Phase::Prepare
        } else {
            Phase::Reward
        };

        PhaseClassification {
            cycle: self.burn_height_to_reward_cycle(height),
            phase,
            neglected: self.is_in_neglected_phase(height),
        }
    }

    /// Smallest height `>= from` satisfying `pred`.
    ///
    /// Every phase recurs within one cycle, except that nothing at or below `first` is ever
    /// neglected, so a second window starting right after `first` covers that case.
    fn next_height_where(&self, from: u64, pred: impl Fn(u64) -> bool) -> u64 {
        let scan = |start: u64| {
            (start..=start.saturating_add(self.cycle_length)).find(|h| pred(*h))
        };

        scan(from)
            .or_else(|| scan(from.max(self.first.saturating_add(1))))
            .unwrap_or(from)
    }

    /// First height `>= from` in the prepare phase under `policy`.
    pub fn next_prepare_phase_height(&self, from: u64, policy: PreparePhasePolicy) -> u64 {
        self.next_height_where(from, |h| self.is_in_prepare_phase(h, policy))
    }

    /// First height `>= from` in the reward phase under `policy`.
    pub fn next_reward_phase_height(&self, from: u64, policy: PreparePhasePolicy) -> u64 {
        self.next_height_where(from, |h| !self.is_in_prepare_phase(h, policy))
    }

    /// First height `>= from` in the neglected phase.
    pub fn next_neglected_phase_height(&self, from: u64) -> u64 {
        self.next_height_where(from, |h| self.is_in_neglected_phase(h))
    }

    /// Number of blocks from `height` until the prepare phase starts, zero if already in it.
    pub fn blocks_until_prepare_phase(&self, height: u64, policy: PreparePhasePolicy) -> u64 {
        self.next_prepare_phase_height(height, policy) - height
    }

    /// Number of blocks from `height` until the reward phase starts, zero if already in it.
    pub fn blocks_until_reward_phase(&self, height: u64, policy: PreparePhasePolicy) -> u64 {
        self.next_reward_phase_height(height, policy) - height
    }

    /// Burn height at which funds locked at `stack_height` for `lock_period` cycles unlock.
    ///
    /// Stacking at any height of cycle `n` locks for cycles `n + 1 ..= n + lock_period`, and the
    /// funds unlock at the first block of cycle `n + lock_period + 1`.
    pub fn expected_unlock_height(
        &self,
        stack_height: u64,
        lock_period: u64,
    ) -> Result<u64, ParamsError> {
        let cycle = self.burn_height_to_reward_cycle(stack_height).max(0) as u64;
        cycle
            .checked_add(lock_period)
            .and_then(|c| c.checked_add(1))
            .and_then(|c| c.checked_mul(self.cycle_length))
            .and_then(|offset| self.first.checked_add(offset))
            .ok_or(ParamsError::HeightOverflow)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn params() -> CycleParams {
        CycleParams::new(0, 10, 4).expect("valid params")
    }

    #[test]
    fn rejects_degenerate_params() {
        assert_eq!(CycleParams::new(0, 0, 0), Err(ParamsError::ZeroCycleLength));
        assert_eq!(
            CycleParams::new(0, 10, 0),
            Err(ParamsError::InvalidPrepareLength {
                prepare: 0,
                cycle: 10
            })
        );
        assert_eq!(
            CycleParams::new(0, 10, 10),
            Err(ParamsError::InvalidPrepareLength {
                prepare: 10,
                cycle: 10
            })
        );
    }

    #[test]
    fn cycle_ids() {
        let p = CycleParams::new(100, 10, 4).expect("valid params");
        assert_eq!(p.burn_height_to_reward_cycle(100), 0);
        assert_eq!(p.burn_height_to_reward_cycle(109), 0);
        assert_eq!(p.burn_height_to_reward_cycle(110), 1);
        assert_eq!(p.burn_height_to_reward_cycle(99), -1);
        assert_eq!(p.burn_height_to_reward_cycle(90), -1);
        assert_eq!(p.burn_height_to_reward_cycle(89), -2);
        assert_eq!(p.reward_cycle_to_burn_height(3), 130);
    }

    #[test]
    fn prepare_phase_boundaries() {
        let p = params();
        let policy = PreparePhasePolicy::Inclusive;

        assert!(!p.is_in_prepare_phase(5, policy));
        assert!(p.is_in_prepare_phase(6, policy));
        assert!(p.is_in_prepare_phase(9, policy));
        assert!(!p.is_in_prepare_phase(10, policy));
    }

    #[test]
    fn exclusive_policy_starts_one_block_later() {
        let p = params();
        let policy = PreparePhasePolicy::Exclusive;

        assert!(!p.is_in_prepare_phase(6, policy));
        assert!(p.is_in_prepare_phase(7, policy));
        assert!(p.is_in_prepare_phase(9, policy));
        assert!(!p.is_in_prepare_phase(10, policy));
    }

    #[test]
    fn neglected_phase_is_shifted_by_one() {
        let p = params();

        assert!(!p.is_in_neglected_phase(0));
        assert!(!p.is_in_neglected_phase(5));
        assert!(!p.is_in_neglected_phase(6));
        assert!(p.is_in_neglected_phase(7));
        assert!(p.is_in_neglected_phase(9));
        assert!(p.is_in_neglected_phase(10));
        assert!(!p.is_in_neglected_phase(11));
    }

    #[test]
    fn first_block_of_cycle_is_reward_and_neglected() {
        let class = params().classify(10, PreparePhasePolicy::Inclusive);

        assert_eq!(class.phase, Phase::Reward);
        assert!(class.neglected);
        assert_eq!(class.cycle, 1);
    }

    #[test]
    fn next_phase_heights() {
        let p = params();
        let policy = PreparePhasePolicy::Inclusive;

        assert_eq!(p.next_prepare_phase_height(2, policy), 6);
        assert_eq!(p.next_prepare_phase_height(7, policy), 7);
        assert_eq!(p.next_reward_phase_height(7, policy), 10);
        assert_eq!(p.next_reward_phase_height(3, policy), 3);
        assert_eq!(p.next_neglected_phase_height(2), 7);
        assert_eq!(p.next_neglected_phase_height(10), 10);
        assert_eq!(p.next_neglected_phase_height(0), 7);
        assert_eq!(p.blocks_until_prepare_phase(2, policy), 4);
        assert_eq!(p.blocks_until_reward_phase(8, policy), 2);
    }

    #[test]
    fn next_phase_heights_below_first() {
        let p = CycleParams::new(100, 10, 4).expect("valid params");

        assert_eq!(p.next_neglected_phase_height(5), 107);
        assert_eq!(
            p.next_prepare_phase_height(5, PreparePhasePolicy::Inclusive),
            6
        );
    }

    #[test]
    fn unlock_height_matches_lock_period() {
        let p = CycleParams::new(0, 20, 5).expect("valid params");

        // Stacked in cycle 2 for one cycle: locked for cycle 3, unlocks at the start of cycle 4.
        assert_eq!(p.expected_unlock_height(47, 1), Ok(80));
        assert_eq!(p.burn_height_to_reward_cycle(80), 4);
        assert_eq!(
            p.expected_unlock_height(47, u64::MAX),
            Err(ParamsError::HeightOverflow)
        );
    }

    #[test]
    fn deserialization_validates() {
        let p: CycleParams =
            serde_json::from_str(r#"{"first":3,"cycle_length":20,"prepare_length":5}"#)
                .expect("valid params");
        assert_eq!(p, CycleParams::new(3, 20, 5).expect("valid params"));

        assert!(serde_json::from_str::<CycleParams>(
            r#"{"first":0,"cycle_length":0,"prepare_length":0}"#
        )
        .is_err());
        assert!(serde_json::from_str::<CycleParams>(
            r#"{"first":0,"cycle_length":10,"prepare_length":10}"#
        )
        .is_err());
    }

    fn arb_params() -> impl Strategy<Value = CycleParams> {
        (0..10_000u64, 2..200u64)
            .prop_flat_map(|(first, cycle)| (Just(first), Just(cycle), 1..cycle))
            .prop_map(|(first, cycle, prepare)| {
                CycleParams::new(first, cycle, prepare).expect("generated params are valid")
            })
    }

    proptest! {
        #[test]
        fn cycle_round_trip(p in arb_params(), cycle in 0..1_000_000u64) {
            let height = p.reward_cycle_to_burn_height(cycle);
            prop_assert_eq!(p.burn_height_to_reward_cycle(height), cycle as i64);
            prop_assert_eq!(p.cycle_position(height), 0);
        }

        #[test]
        fn prepare_window_sizes(p in arb_params(), cycle in 1..1_000u64) {
            let start = p.reward_cycle_to_burn_height(cycle);
            let window = start..start + p.cycle_length();
            let count = |policy| {
                window
                    .clone()
                    .filter(|h| p.is_in_prepare_phase(*h, policy))
                    .count() as u64
            };

            prop_assert_eq!(count(PreparePhasePolicy::Inclusive), p.prepare_length());
            prop_assert_eq!(count(PreparePhasePolicy::Exclusive), p.prepare_length() - 1);
            prop_assert_eq!(count(PreparePhasePolicy::ShiftedByOne), p.prepare_length());
        }

        #[test]
        fn neglected_is_inclusive_prepare_shifted(p in arb_params(), offset in 1..100_000u64) {
            let height = p.first() + offset;
            prop_assert_eq!(
                p.is_in_neglected_phase(height),
                p.is_in_prepare_phase(height - 1, PreparePhasePolicy::Inclusive)
            );
        }

        #[test]
        fn next_heights_land_in_phase(p in arb_params(), from in 0..100_000u64) {
            let policy = PreparePhasePolicy::Inclusive;
            let prepare = p.next_prepare_phase_height(from, policy);
            let reward = p.next_reward_phase_height(from, policy);
            let neglected = p.next_neglected_phase_height(from);

            prop_assert!(prepare >= from && p.is_in_prepare_phase(prepare, policy));
            prop_assert!(reward >= from && !p.is_in_prepare_phase(reward, policy));
            prop_assert!(neglected >= from && p.is_in_neglected_phase(neglected));
        }
    }
}
