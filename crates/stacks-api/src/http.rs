//! HTTP client for the node's core API and the indexer's extended API.

use async_trait::async_trait;
use pox_params::types::PoxInfo;
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, info, warn};

use crate::{
    config::ApiConfig,
    error::ClientError,
    traits::{AccountApi, ChainInfoApi, RewardsApi, TxBroadcaster},
    types::{
        AccountInfo, AccountNonces, BurnchainReward, Page, Pox4Event, SignedTransaction, TxId,
        TxRecord,
    },
};

/// The subset of `/v2/info` the harness reads.
#[derive(Debug, Deserialize)]
struct CoreInfo {
    burn_block_height: u64,
}

/// Body of a rejected broadcast.
#[derive(Debug, Deserialize)]
struct Rejection {
    #[serde(default)]
    reason: Option<String>,

    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    reason_data: Option<serde_json::Value>,
}

/// Client for the HTTP endpoints of the node and the indexer.
#[derive(Debug, Clone)]
pub struct StacksApiClient {
    base: String,
    http: Client,
}

impl StacksApiClient {
    /// Builds a client for the endpoints in `config`.
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            base: config.api_url().to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        decode(check_status(response).await?).await
    }
}

/// Maps error statuses to [`ClientError`]s, passing successful responses through.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::BAD_GATEWAY => {
            warn!(url = %response.url(), "bad gateway");
            Err(ClientError::BadGateway)
        }
        StatusCode::NOT_FOUND => Err(ClientError::NotFound),
        _ => Err(ClientError::Status {
            code: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl ChainInfoApi for StacksApiClient {
    async fn burn_block_height(&self) -> Result<u64, ClientError> {
        let info: CoreInfo = self.get_json("/v2/info").await?;
        Ok(info.burn_block_height)
    }

    async fn pox_info(&self) -> Result<PoxInfo, ClientError> {
        self.get_json("/v2/pox").await
    }
}

#[async_trait]
impl AccountApi for StacksApiClient {
    async fn account_info(&self, principal: &str) -> Result<AccountInfo, ClientError> {
        self.get_json(&format!("/v2/accounts/{principal}?proof=0"))
            .await
    }

    async fn account_nonces(&self, principal: &str) -> Result<AccountNonces, ClientError> {
        self.get_json(&format!("/extended/v1/address/{principal}/nonces"))
            .await
    }
}

#[async_trait]
impl TxBroadcaster for StacksApiClient {
    async fn broadcast(&self, tx: &SignedTransaction) -> Result<TxId, ClientError> {
        let response = self
            .http
            .post(self.url("/v2/transactions"))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(tx.as_bytes().to_vec())
            .send()
            .await?;

        if response.status() == StatusCode::BAD_REQUEST {
            let rejection: Rejection = decode(response).await?;
            let reason = rejection
                .reason
                .or(rejection.error)
                .unwrap_or_else(|| "unknown".to_string());
            warn!(tx_id = %tx.tx_id(), %reason, "transaction rejected");
            return Err(ClientError::Rejected {
                reason,
                reason_data: rejection.reason_data,
            });
        }

        let tx_id: TxId = decode(check_status(response).await?).await?;
        info!(%tx_id, "broadcasted transaction");

        Ok(tx_id)
    }
}

#[async_trait]
impl RewardsApi for StacksApiClient {
    async fn burnchain_rewards(&self, address: &str) -> Result<Vec<BurnchainReward>, ClientError> {
        let page: Page<BurnchainReward> = self
            .get_json(&format!("/extended/v1/burnchain/rewards/{address}"))
            .await?;
        Ok(page.results)
    }

    async fn pox4_events(&self) -> Result<Vec<Pox4Event>, ClientError> {
        let page: Page<Pox4Event> = self.get_json("/extended/v1/pox4/events").await?;
        Ok(page.results)
    }

    async fn transaction(&self, tx_id: &TxId) -> Result<Option<TxRecord>, ClientError> {
        match self.get_json(&format!("/extended/v1/tx/{tx_id}")).await {
            Ok(record) => Ok(Some(record)),
            Err(ClientError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
