//! Configuration for the harness.
use std::time::Duration;

use coord::retry::{Classify, Strategy};
use pox_params::phase::PreparePhasePolicy;
use serde::{Deserialize, Serialize};
use stacks_api::config::ApiConfig;

use crate::nonce::NonceSource;

/// Default interval between polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default number of counted failures tolerated per remote read.
pub const DEFAULT_RETRY_COUNT: usize = 3;

/// Default deadline for a transaction to be mined, in milliseconds.
pub const DEFAULT_CONFIRMATION_TIMEOUT_MS: u64 = 15_000;

/// Knobs shared by every component of the harness.
///
/// Durations are stored in milliseconds so the config reads naturally from TOML. Construct one
/// with [`Default::default`] or [`HarnessConfig::from_toml_str`] and adjust it with the `with_*`
/// methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Endpoints of the node and the indexer.
    #[serde(flatten)]
    pub api: ApiConfig,

    /// Interval between polls, in milliseconds.
    pub poll_interval: u64,

    /// Delay between retries of a failed remote read, in milliseconds. Zero retries immediately.
    pub retry_interval: u64,

    /// Number of counted failures tolerated per remote read. Transient failures are not counted.
    pub retry_count: usize,

    /// Deadline for a tracked transaction to be mined, in milliseconds. `None` waits forever.
    pub confirmation_timeout: Option<u64>,

    /// Where nonces are read from by default.
    pub nonce_source: NonceSource,

    /// Which definition of the prepare phase to apply.
    pub prepare_phase_policy: PreparePhasePolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL_MS,
            retry_interval: 0,
            retry_count: DEFAULT_RETRY_COUNT,
            confirmation_timeout: Some(DEFAULT_CONFIRMATION_TIMEOUT_MS),
            nonce_source: NonceSource::default(),
            prepare_phase_policy: PreparePhasePolicy::default(),
        }
    }
}

impl HarnessConfig {
    /// Parses a config from TOML. Missing keys take their default values.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Updates the endpoints and returns the updated config.
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Updates the poll interval and returns the updated config.
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.as_millis() as u64;
        self
    }

    /// Updates the retry delay and returns the updated config.
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval.as_millis() as u64;
        self
    }

    /// Updates the retry budget and returns the updated config.
    pub const fn with_retry_count(mut self, count: usize) -> Self {
        self.retry_count = count;
        self
    }

    /// Updates the confirmation deadline and returns the updated config.
    pub const fn with_confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = match timeout {
            Some(t) => Some(t.as_millis() as u64),
            None => None,
        };
        self
    }

    /// Updates the default nonce source and returns the updated config.
    pub const fn with_nonce_source(mut self, source: NonceSource) -> Self {
        self.nonce_source = source;
        self
    }

    /// Updates the prepare phase policy and returns the updated config.
    pub const fn with_prepare_phase_policy(mut self, policy: PreparePhasePolicy) -> Self {
        self.prepare_phase_policy = policy;
        self
    }

    /// Returns the interval between polls.
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    /// Returns the delay between retries.
    pub const fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval)
    }

    /// Returns the confirmation deadline, if any.
    pub const fn confirmation_timeout(&self) -> Option<Duration> {
        match self.confirmation_timeout {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }

    /// Returns the retry strategy for remote reads: errors classify themselves, counted failures
    /// are limited to [`HarnessConfig::retry_count`].
    pub fn retry_strategy<E: Classify + 'static>(&self) -> Strategy<E> {
        Strategy::classified(self.retry_count).with_delay(self.retry_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = HarnessConfig::from_toml_str("").expect("must parse");
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.retry_interval(), Duration::ZERO);
        assert_eq!(
            config.confirmation_timeout(),
            Some(Duration::from_secs(15))
        );
    }

    #[test]
    fn parses_toml() {
        let config = HarnessConfig::from_toml_str(
            r#"
            api_url = "http://stacks-api:3999"
            request_timeout = 2000
            poll_interval = 500
            retry_count = 5
            nonce_source = "mempool"
            prepare_phase_policy = "shifted_by_one"
            "#,
        )
        .expect("must parse");

        assert_eq!(config.api.api_url, "http://stacks-api:3999");
        assert_eq!(config.api.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.retry_count, 5);
        assert_eq!(config.nonce_source, NonceSource::Mempool);
        assert_eq!(
            config.prepare_phase_policy,
            PreparePhasePolicy::ShiftedByOne
        );
        assert_eq!(
            config.confirmation_timeout,
            Some(DEFAULT_CONFIRMATION_TIMEOUT_MS)
        );
    }

    #[test]
    fn builders_round_trip_through_accessors() {
        let config = HarnessConfig::default()
            .with_poll_interval(Duration::from_millis(250))
            .with_retry_interval(Duration::from_millis(50))
            .with_retry_count(1)
            .with_confirmation_timeout(None);

        assert_eq!(config.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.retry_interval(), Duration::from_millis(50));
        assert_eq!(config.confirmation_timeout(), None);

        let strategy = config.retry_strategy::<stacks_api::error::ClientError>();
        assert_eq!(strategy.max_attempts(), 1);
        assert_eq!(strategy.delay(), Duration::from_millis(50));
    }
}
