//! Endpoint configuration for the API clients.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Path of the indexer's WebSocket endpoint.
pub const WS_PATH: &str = "/extended/v1/ws";

/// Endpoints of the node and the indexer.
///
/// The node's core API and the indexer's extended API are expected behind the same base URL, as
/// is the case for the usual local deployments. Construct with [`Default::default`] and adjust
/// with the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the HTTP API, e.g. `http://localhost:3999`.
    pub api_url: String,

    /// URL of the WebSocket feed. Derived from [`ApiConfig::api_url`] when absent.
    pub ws_url: Option<String>,

    /// Timeout for each HTTP request in milliseconds.
    pub request_timeout: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3999".to_string(),
            ws_url: None,
            request_timeout: 10_000,
        }
    }
}

impl ApiConfig {
    /// Updates the HTTP base URL and returns the updated config.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Updates the WebSocket URL and returns the updated config.
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Updates the per-request timeout and returns the updated config.
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout.as_millis() as u64;
        self
    }

    /// Returns the per-request timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }

    /// Returns the HTTP base URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Returns the WebSocket URL, deriving it from the HTTP base URL if none was configured.
    pub fn ws_url(&self) -> Result<String, ClientError> {
        if let Some(url) = &self.ws_url {
            return Ok(url.clone());
        }

        let base = self.api_url();
        let rest = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(ClientError::InvalidUrl(self.api_url.clone()));
        };

        Ok(format!("{rest}{WS_PATH}"))
    }
}
