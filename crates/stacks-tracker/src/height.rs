//! Waiting on burn heights and reward phases.

use std::convert::Infallible;

use coord::{poll::wait_until, predicate, retry::retry_with};
use pox_params::{phase::CycleParams, types::PoxInfo};
use stacks_api::{error::ClientError, traits::ChainInfoApi};
use tracing::{debug, info};

use crate::{config::HarnessConfig, error::TrackerError};

/// Observes the burn chain through a [`ChainInfoApi`].
#[derive(Debug, Clone)]
pub struct ChainClock<C> {
    api: C,
    config: HarnessConfig,
}

impl<C: ChainInfoApi> ChainClock<C> {
    /// Creates a clock reading from `api`.
    pub const fn new(api: C, config: HarnessConfig) -> Self {
        Self { api, config }
    }

    /// Returns the current burn height. Reads are retried with the configured budget.
    pub async fn burn_block_height(&self) -> Result<u64, TrackerError> {
        let strategy = self.config.retry_strategy();
        Ok(retry_with(strategy, move || self.api.burn_block_height()).await?)
    }

    /// Returns a fresh PoX snapshot. Reads are retried with the configured budget.
    pub async fn pox_info(&self) -> Result<PoxInfo, TrackerError> {
        let strategy = self.config.retry_strategy();
        Ok(retry_with(strategy, move || self.api.pox_info()).await?)
    }

    async fn observe_height(&self, target: u64) -> Result<u64, TrackerError> {
        let height = self.burn_block_height().await?;
        if height < target {
            debug!(height, target, "waiting for burn height");
        }
        Ok(height)
    }

    /// Polls until the burn height reaches `target` and returns the height observed.
    ///
    /// Unbounded; wrap the call in a deadline to bound it.
    pub async fn wait_for_burn_block_height(&self, target: u64) -> Result<u64, TrackerError> {
        let height = wait_until(
            move || self.observe_height(target),
            predicate::ge(target),
            self.config.poll_interval(),
        )
        .await?;
        info!(height, target, "reached burn height");

        Ok(height)
    }

    /// Waits until the chain enters the prepare phase, as seen from `info`.
    ///
    /// Returns immediately if the snapshot's height is already in the prepare phase.
    pub async fn wait_for_prepare_phase(&self, info: &PoxInfo) -> Result<u64, TrackerError> {
        let policy = self.config.prepare_phase_policy;
        self.wait_for(info, |params, height| {
            params.next_prepare_phase_height(height, policy)
        })
        .await
    }

    /// Waits until the chain enters the reward phase, as seen from `info`.
    pub async fn wait_for_reward_phase(&self, info: &PoxInfo) -> Result<u64, TrackerError> {
        let policy = self.config.prepare_phase_policy;
        self.wait_for(info, |params, height| {
            params.next_reward_phase_height(height, policy)
        })
        .await
    }

    /// Waits until the chain enters the neglected phase, as seen from `info`.
    pub async fn wait_for_neglected_phase(&self, info: &PoxInfo) -> Result<u64, TrackerError> {
        self.wait_for(info, |params, height| {
            params.next_neglected_phase_height(height)
        })
        .await
    }

    async fn wait_for(
        &self,
        info: &PoxInfo,
        next: impl FnOnce(&CycleParams, u64) -> u64,
    ) -> Result<u64, TrackerError> {
        let params = info.cycle_params()?;
        let height = info.current_height()?;
        let target = next(&params, height);
        if target == height {
            return Ok(height);
        }

        self.wait_for_burn_block_height(target).await
    }

    /// Waits until the contract version at `version` (see
    /// [`POX_4_VERSION_INDEX`](pox_params::constants::POX_4_VERSION_INDEX)) is active.
    pub async fn wait_for_activation(&self, version: usize) -> Result<u64, TrackerError> {
        let info = self.pox_info().await?;
        let activation = info.activation_height(version)?;
        self.wait_for_burn_block_height(activation).await
    }

    /// Polls until the node answers, ignoring failures, and returns its burn height.
    pub async fn wait_for_node(&self) -> Result<u64, TrackerError> {
        let answer = wait_until(
            move || async move {
                let answer = self.api.burn_block_height().await;
                if let Err(e) = &answer {
                    debug!(%e, "node not ready");
                }
                Ok::<Result<u64, ClientError>, Infallible>(answer)
            },
            Result::is_ok,
            self.config.poll_interval(),
        )
        .await;

        match answer {
            Ok(Ok(height)) => Ok(height),
            Ok(Err(e)) => Err(e.into()),
            Err(never) => match never {},
        }
    }
}
