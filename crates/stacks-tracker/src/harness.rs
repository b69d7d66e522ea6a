//! Wiring of the components against the real node and indexer.

use stacks_api::{http::StacksApiClient, ws::WsTxStatusFeed};

use crate::{
    config::HarnessConfig, error::TrackerError, height::ChainClock, nonce::NonceSequencer,
    tracker::TransactionConfirmationTracker,
};

/// The components of the harness, connected to the endpoints of one [`HarnessConfig`].
#[derive(Debug, Clone)]
pub struct Harness {
    client: StacksApiClient,
    clock: ChainClock<StacksApiClient>,
    tracker: TransactionConfirmationTracker<StacksApiClient, WsTxStatusFeed>,
    config: HarnessConfig,
}

impl Harness {
    /// Builds the clients for the endpoints in `config`. Nothing is contacted until first use.
    pub fn new(config: HarnessConfig) -> Result<Self, TrackerError> {
        let client = StacksApiClient::new(&config.api)?;
        let feed = WsTxStatusFeed::new(&config.api)?;

        Ok(Self {
            clock: ChainClock::new(client.clone(), config.clone()),
            tracker: TransactionConfirmationTracker::new(client.clone(), feed, config.clone()),
            client,
            config,
        })
    }

    /// Returns the HTTP client, for the read-only verification endpoints.
    pub const fn client(&self) -> &StacksApiClient {
        &self.client
    }

    /// Returns the burn chain clock.
    pub const fn clock(&self) -> &ChainClock<StacksApiClient> {
        &self.clock
    }

    /// Returns the transaction tracker.
    pub const fn tracker(
        &self,
    ) -> &TransactionConfirmationTracker<StacksApiClient, WsTxStatusFeed> {
        &self.tracker
    }

    /// Returns a nonce sequencer for `principal`.
    pub fn nonces(&self, principal: impl Into<String>) -> NonceSequencer<StacksApiClient> {
        NonceSequencer::new(self.client.clone(), principal, self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use stacks_api::{config::ApiConfig, error::ClientError};

    use super::*;

    #[test]
    fn builds_from_default_config() {
        let harness = Harness::new(HarnessConfig::default()).expect("default endpoints are valid");
        let nonces = harness.nonces("ST1");

        assert_eq!(nonces.principal(), "ST1");
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        let config =
            HarnessConfig::default().with_api(ApiConfig::default().with_api_url("localhost:3999"));

        assert!(matches!(
            Harness::new(config),
            Err(TrackerError::Client(ClientError::InvalidUrl(_)))
        ));
    }
}
