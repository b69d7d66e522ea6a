//! Transaction status feed over the indexer's WebSocket JSON-RPC endpoint.
//!
//! Every subscription owns its own socket. A reader task forwards `tx_update` notifications for the
//! subscribed transaction to the handler until the [`FeedHandle`] is released, at which point it
//! sends a best-effort `unsubscribe` and closes the socket.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, trace, warn};

use crate::{
    config::ApiConfig,
    error::ClientError,
    subscription::FeedHandle,
    traits::{TxStatusFeed, UpdateHandler},
    types::{TxId, TxRecord},
};

/// Notification method carrying transaction updates.
const TX_UPDATE: &str = "tx_update";

#[derive(Debug, Serialize)]
struct RpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: SubscriptionParams,
}

#[derive(Debug, Serialize)]
struct SubscriptionParams {
    event: &'static str,
    tx_id: TxId,
}

impl RpcRequest {
    fn new(id: u64, method: &'static str, tx_id: TxId) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params: SubscriptionParams {
                event: TX_UPDATE,
                tx_id,
            },
        }
    }

    fn to_message(&self) -> Result<Message, ClientError> {
        Ok(Message::Text(serde_json::to_string(self)?))
    }
}

/// Any message the server sends: a response to one of our requests or a notification.
#[derive(Debug, Deserialize)]
struct RpcMessage {
    #[serde(default)]
    method: Option<String>,

    #[serde(default)]
    params: Option<serde_json::Value>,

    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Extracts the transaction update carried by `text`, if any.
fn parse_update(text: &str) -> Result<Option<TxRecord>, ClientError> {
    let message: RpcMessage = serde_json::from_str(text)?;

    if let Some(error) = message.error {
        warn!(%error, "status feed returned an error");
        return Ok(None);
    }

    match (message.method.as_deref(), message.params) {
        (Some(TX_UPDATE), Some(params)) => Ok(Some(serde_json::from_value(params)?)),
        _ => Ok(None),
    }
}

/// [`TxStatusFeed`] backed by the indexer's WebSocket endpoint.
#[derive(Debug, Clone)]
pub struct WsTxStatusFeed {
    url: String,
}

impl WsTxStatusFeed {
    /// Creates a feed for the WebSocket endpoint in `config`.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        Ok(Self {
            url: config.ws_url()?,
        })
    }
}

#[async_trait]
impl TxStatusFeed for WsTxStatusFeed {
    async fn subscribe(
        &self,
        tx_id: &TxId,
        handler: UpdateHandler,
    ) -> Result<FeedHandle, ClientError> {
        let tx_id = *tx_id;
        let (stream, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = stream.split();

        write
            .send(RpcRequest::new(0, "subscribe", tx_id).to_message()?)
            .await?;
        debug!(%tx_id, url = %self.url, "subscribed to transaction updates");

        let (stop, mut stopped) = oneshot::channel::<()>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // Fires on an explicit release and when the handle is dropped.
                    _ = &mut stopped => {
                        if let Ok(message) = RpcRequest::new(1, "unsubscribe", tx_id).to_message() {
                            let _ = write.send(message).await;
                        }
                        let _ = write.close().await;
                        break;
                    }
                    message = read.next() => match message {
                        Some(Ok(Message::Text(text))) => match parse_update(&text) {
                            Ok(Some(record)) if record.tx_id == tx_id => handler(record),
                            Ok(_) => trace!(%tx_id, "ignoring status feed message"),
                            Err(e) => warn!(%tx_id, %e, "undecodable status feed message"),
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            debug!(%tx_id, "status feed closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(%tx_id, %e, "status feed connection failed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(FeedHandle::new(tx_id, move || {
            // The reader may already be gone; nothing is left to release then.
            let _ = stop.send(());
        }))
    }
}
