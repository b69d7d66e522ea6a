//! Errors returned by the remote API clients.

use coord::retry::{Classify, ErrorClass};
use thiserror::Error;

/// Error while talking to the node or the indexer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The gateway in front of the service answered with HTTP 502. Usually heals by itself.
    #[error("bad gateway")]
    BadGateway,

    /// The service answered with an unexpected status code.
    #[error("unexpected status {code}: {body}")]
    Status {
        /// HTTP status code.
        code: u16,

        /// Response body, as text.
        body: String,
    },

    /// The node refused to accept a transaction into its mempool.
    #[error("transaction rejected: {reason}")]
    Rejected {
        /// Machine readable rejection reason, e.g. `ConflictingNonceInMempool`.
        reason: String,

        /// Additional details supplied by the node.
        reason_data: Option<serde_json::Value>,
    },

    /// The requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The request could not be sent or the response could not be read.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    /// The WebSocket connection failed.
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A configured endpoint is not a usable URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl Classify for ClientError {
    fn classify(&self) -> ErrorClass {
        match self {
            ClientError::BadGateway => ErrorClass::TRANSIENT,
            _ => ErrorClass::COUNTED,
        }
    }
}
