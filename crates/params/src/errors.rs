//! Errors for the reward-cycle parameters.

use thiserror::Error;

/// Error while validating or querying reward-cycle parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    /// The reward cycle length must be positive.
    #[error("reward cycle length must be positive")]
    ZeroCycleLength,

    /// The prepare phase must be non-empty and strictly shorter than the cycle.
    #[error("prepare phase length {prepare} must be in 1..{cycle}")]
    InvalidPrepareLength {
        /// Reported prepare phase length.
        prepare: u64,

        /// Reported reward cycle length.
        cycle: u64,
    },

    /// A derived burn height does not fit in a `u64`.
    #[error("burn height overflows")]
    HeightOverflow,

    /// The snapshot does not carry the burn height it was taken at.
    #[error("pox info has no current burnchain block height")]
    MissingCurrentHeight,

    /// The node does not report the requested contract version.
    #[error("pox contract version {0} is not known to the node")]
    UnknownContractVersion(usize),
}
