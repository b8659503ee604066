//! JSON-RPC client for the network fullnode

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::chain::{Address, CoinMetadata, FinalityStatus, TokenId, TransactionDigest};
use crate::domain::execution::network::{BalanceSource, CoinMetadataSource, NetworkExecutor};
use crate::shared::config::NetworkConfig;
use crate::shared::errors::SwapError;

static GLOBAL_CLIENT: OnceCell<Arc<FullnodeClient>> = OnceCell::new();

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResult {
    total_balance: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinMetadataResult {
    symbol: String,
    name: String,
    decimals: u8,
    icon_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteResult {
    digest: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionStatusResult {
    status: String,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

impl TransactionStatusResult {
    fn into_finality(self) -> FinalityStatus {
        if self.status == "finalized" {
            FinalityStatus::Finalized {
                success: self.success.unwrap_or(false),
                error: self.error,
            }
        } else {
            FinalityStatus::Pending
        }
    }
}

/// HTTP JSON-RPC fullnode client. One instance per process is enough;
/// see [`global`].
pub struct FullnodeClient {
    http_client: Client,
    rpc_url: String,
    request_id: AtomicU64,
}

/// Process-wide client, initialized once on first use. Later calls reuse
/// the same instance regardless of the config they pass.
pub fn global(config: &NetworkConfig) -> Arc<FullnodeClient> {
    GLOBAL_CLIENT
        .get_or_init(|| Arc::new(FullnodeClient::new(config)))
        .clone()
}

impl FullnodeClient {
    pub fn new(config: &NetworkConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("failed to construct HTTP client");
        Self {
            http_client,
            rpc_url: config.rpc_url.clone(),
            request_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, SwapError> {
        self.call_nullable(method, params)
            .await?
            .ok_or_else(|| SwapError::Rpc(format!("{}: response carried no result", method)))
    }

    /// JSON-RPC call where a null result is meaningful, not an error
    async fn call_nullable<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, SwapError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!("rpc {} -> {}", method, self.rpc_url);

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SwapError::Rpc(format!("{}: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(SwapError::Rpc(format!(
                "{}: fullnode returned status {}",
                method,
                response.status()
            )));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| SwapError::Rpc(format!("{}: undecodable response: {}", method, e)))?;

        if let Some(error) = body.error {
            return Err(SwapError::Rpc(format!(
                "{}: {} (code {})",
                method, error.message, error.code
            )));
        }
        Ok(body.result)
    }
}

#[async_trait]
impl BalanceSource for FullnodeClient {
    async fn balance(&self, owner: &Address, token: &TokenId) -> Result<u64, SwapError> {
        let result: BalanceResult = self
            .call(
                "wallet_getBalance",
                json!([owner.to_string(), token.as_str()]),
            )
            .await?;
        result
            .total_balance
            .parse::<u64>()
            .map_err(|_| SwapError::Rpc(format!("non-numeric balance: {}", result.total_balance)))
    }
}

#[async_trait]
impl CoinMetadataSource for FullnodeClient {
    async fn coin_metadata(&self, token: &TokenId) -> Result<CoinMetadata, SwapError> {
        let result: CoinMetadataResult = self
            .call("wallet_getCoinMetadata", json!([token.as_str()]))
            .await?;
        Ok(CoinMetadata {
            symbol: result.symbol,
            name: result.name,
            decimals: result.decimals,
            icon_url: result.icon_url,
        })
    }
}

#[async_trait]
impl NetworkExecutor for FullnodeClient {
    async fn submit(
        &self,
        tx_bytes: &[u8],
        signature: &[u8],
    ) -> Result<TransactionDigest, SwapError> {
        let result: ExecuteResult = self
            .call(
                "wallet_executeTransaction",
                json!([BASE64.encode(tx_bytes), BASE64.encode(signature)]),
            )
            .await?;
        result
            .digest
            .parse()
            .map_err(|e| SwapError::Rpc(format!("bad digest in response: {}", e)))
    }

    async fn wait_for_finality(
        &self,
        digest: &TransactionDigest,
    ) -> Result<FinalityStatus, SwapError> {
        let result: TransactionStatusResult = self
            .call("wallet_waitForTransaction", json!([digest.to_string()]))
            .await?;
        Ok(result.into_finality())
    }

    async fn status_by_digest(
        &self,
        digest: &TransactionDigest,
    ) -> Result<Option<FinalityStatus>, SwapError> {
        let result: Option<TransactionStatusResult> = self
            .call_nullable("wallet_getTransactionStatus", json!([digest.to_string()]))
            .await?;
        Ok(result.map(TransactionStatusResult::into_finality))
    }

    async fn reference_gas_price(&self) -> Result<u64, SwapError> {
        let result: String = self.call("wallet_getReferenceGasPrice", json!([])).await?;
        result
            .parse::<u64>()
            .map_err(|_| SwapError::Rpc(format!("non-numeric gas price: {}", result)))
    }
}
