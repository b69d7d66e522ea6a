//! This crate contains the reward-cycle parameters reported by a Stacks node and the pure
//! arithmetic that classifies burn heights against them.
//!
//! Nothing in here performs I/O. A [`PoxInfo`](types::PoxInfo) snapshot is only meaningful for the
//! burn height it was fetched alongside, so callers re-fetch it to observe height progression and
//! every classification is recomputed on each call.

pub mod constants;
pub mod errors;
pub mod phase;
pub mod prelude;
pub mod types;
