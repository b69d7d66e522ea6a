//! Protocol constants.

/// Position of `pox-4` in the `contract_versions` list reported by `/v2/pox`.
pub const POX_4_VERSION_INDEX: usize = 3;

/// Margin, in percent, added on top of the minimum stacking threshold before a balance is deemed
/// sufficient to stack.
pub const DEFAULT_STACKING_MARGIN_PERCENT: u128 = 5;
