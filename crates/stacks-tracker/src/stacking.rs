//! Preconditions for stacking, checked before anything is submitted.

use pox_params::types::PoxInfo;
use stacks_api::types::AccountInfo;

use crate::error::TrackerError;

/// Locked balance of an account that is stacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackingDetails {
    /// Locked amount in micro-STX.
    pub locked: u128,

    /// Burn height at which the amount unlocks.
    pub unlock_height: u64,
}

/// Returns the stacking details of `account`, or [`TrackerError::NotStacked`] if nothing is
/// locked.
pub fn stacking_details(account: &AccountInfo) -> Result<StackingDetails, TrackerError> {
    if account.locked == 0 {
        return Err(TrackerError::NotStacked);
    }

    Ok(StackingDetails {
        locked: account.locked,
        unlock_height: account.unlock_height,
    })
}

/// Returns the balance needed to stack in the next cycle with `margin_percent` headroom above the
/// minimum.
pub fn required_stacking_balance(info: &PoxInfo, margin_percent: u128) -> u128 {
    let minimum = info.next_cycle.min_threshold_ustx.max(info.min_amount_ustx);
    minimum.saturating_mul(100 + margin_percent) / 100
}

/// Checks that `balance` covers the stacking minimum of the next cycle plus `margin_percent`.
///
/// Returns the required balance on success.
pub fn ensure_stacking_balance(
    balance: u128,
    info: &PoxInfo,
    margin_percent: u128,
) -> Result<u128, TrackerError> {
    let required = required_stacking_balance(info, margin_percent);
    if balance < required {
        return Err(TrackerError::InsufficientBalance { balance, required });
    }

    Ok(required)
}

#[cfg(test)]
mod tests {
    use pox_harness_test_utils::{fixtures::MIN_THRESHOLD_USTX, prelude::*};
    use pox_params::constants::DEFAULT_STACKING_MARGIN_PERCENT;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn unlocked_account_is_not_stacked() {
        assert!(matches!(
            stacking_details(&account(1_000, 0, 0, 0)),
            Err(TrackerError::NotStacked)
        ));

        let details = stacking_details(&account(1_000, 500, 160, 3)).expect("is stacking");
        assert_eq!(details.locked, 500);
        assert_eq!(details.unlock_height, 160);
    }

    #[test]
    fn balance_must_cover_margin() {
        let info = pox_info(0, 20, 5, 3);
        let required = MIN_THRESHOLD_USTX * 105 / 100;

        assert!(matches!(
            ensure_stacking_balance(required, &info, DEFAULT_STACKING_MARGIN_PERCENT),
            Ok(r) if r == required
        ));
        assert!(matches!(
            ensure_stacking_balance(required - 1, &info, DEFAULT_STACKING_MARGIN_PERCENT),
            Err(TrackerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn larger_of_the_two_minimums_applies() {
        let mut info = pox_info(0, 20, 5, 3);
        info.next_cycle.min_threshold_ustx = 2 * MIN_THRESHOLD_USTX;

        assert_eq!(required_stacking_balance(&info, 0), 2 * MIN_THRESHOLD_USTX);
    }

    proptest! {
        #[test]
        fn required_balance_grows_with_margin(margin in 0u128..200, extra in 1u128..50) {
            let info = pox_info(0, 20, 5, 3);
            prop_assert!(
                required_stacking_balance(&info, margin)
                    <= required_stacking_balance(&info, margin + extra)
            );
            prop_assert!(required_stacking_balance(&info, margin) >= MIN_THRESHOLD_USTX);
        }
    }
}
