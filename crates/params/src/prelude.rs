//! Re-exports of the most commonly used items.

pub use crate::{
    errors::ParamsError,
    phase::{CycleParams, Phase, PhaseClassification, PreparePhasePolicy},
    types::{ContractVersion, CurrentCycle, NextCycle, PoxInfo},
};
