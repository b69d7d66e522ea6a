//! # `stacks-tracker`
//!
//! Waits on chain state the way a stacking test or operator flow needs to: until a burn height or
//! reward phase is reached, until an account's nonce advances, or until a broadcast transaction is
//! mined.
//!
//! Every component takes its knobs from an explicit [`config::HarnessConfig`] and talks to the
//! remote services only through the traits in [`stacks_api::traits`], so tests can drive them with
//! scripted collaborators.

pub mod batch;
pub mod config;
pub mod error;
pub mod harness;
pub mod height;
pub mod nonce;
pub mod stacking;
pub mod tracker;
