//! FlowX aggregator client

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::{MoveCall, ProgrammableBlock, TokenId, TransactionKind};
use crate::domain::provider::{BuildRequest, ProviderBuild, SwapProvider};
use crate::providers::{impact_to_bps, parse_amount};
use crate::shared::errors::SwapError;
use crate::shared::types::{ProviderId, Quote, Route, RouteHop};

const PROVIDER: ProviderId = ProviderId::FlowX;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteHop {
    pool_id: String,
    token_in: String,
    token_out: String,
    amount_in: String,
    amount_out: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotePath {
    percentage: u8,
    hops: Vec<QuoteHop>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteData {
    amount_in: String,
    amount_out: String,
    #[serde(default)]
    price_impact: Option<String>,
    paths: Vec<QuotePath>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    data: Option<QuoteData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequestBody<'a> {
    sender: String,
    quote: &'a Value,
    slippage_bps: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapCall {
    package: String,
    module: String,
    function: String,
    #[serde(default)]
    type_arguments: Vec<String>,
    #[serde(default)]
    arguments: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapTx {
    move_calls: Vec<SwapCall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    tx: SwapTx,
    expected_amount_out: String,
}

/// Client for the FlowX universal router
pub struct FlowXProvider {
    http_client: Client,
    base_url: String,
}

impl FlowXProvider {
    pub fn new(base_url: String, http_client: Client) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    fn unavailable(reason: impl Into<String>) -> SwapError {
        SwapError::ProviderUnavailable {
            provider: PROVIDER.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SwapProvider for FlowXProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    async fn get_quotes(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: u64,
    ) -> Result<Vec<Quote>, SwapError> {
        let url = format!("{}/quote", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("tokenIn", token_in.as_str()),
                ("tokenOut", token_out.as_str()),
                ("amountIn", &amount_in.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "router returned status {}",
                response.status()
            )));
        }

        let raw: Value = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("undecodable response: {}", e)))?;
        let parsed: QuoteResponse = serde_json::from_value(raw.clone())
            .map_err(|e| Self::unavailable(format!("unexpected response shape: {}", e)))?;

        // A null data field means the router found nothing for the pair
        let Some(data) = parsed.data else {
            return Ok(Vec::new());
        };
        if data.paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut routes = Vec::with_capacity(data.paths.len());
        for path in &data.paths {
            let mut hops = Vec::with_capacity(path.hops.len());
            for hop in &path.hops {
                hops.push(RouteHop {
                    provider: PROVIDER,
                    venue: hop.pool_id.clone(),
                    token_in: TokenId::new(hop.token_in.clone()),
                    token_out: TokenId::new(hop.token_out.clone()),
                    amount_in: parse_amount(&hop.amount_in, PROVIDER, "hop amountIn")?,
                    amount_out: parse_amount(&hop.amount_out, PROVIDER, "hop amountOut")?,
                });
            }
            routes.push(Route {
                percent: path.percentage,
                hops,
            });
        }

        Ok(vec![Quote {
            provider: PROVIDER,
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount_in: parse_amount(&data.amount_in, PROVIDER, "amountIn")?,
            amount_out: parse_amount(&data.amount_out, PROVIDER, "amountOut")?,
            routes,
            price_impact_bps: data.price_impact.as_deref().map(impact_to_bps).unwrap_or(0),
            raw,
        }])
    }

    async fn build_transaction(&self, request: &BuildRequest) -> Result<ProviderBuild, SwapError> {
        let (quote_payload, mut realized) = match &request.quote {
            Some(quote) if quote.provider == PROVIDER => (quote.raw.clone(), quote.clone()),
            _ => {
                let quotes = self
                    .get_quotes(&request.token_in, &request.token_out, request.amount_in)
                    .await?;
                let best = quotes
                    .into_iter()
                    .max_by_key(|q| q.amount_out)
                    .ok_or(SwapError::NoRoute {
                        provider: PROVIDER.to_string(),
                    })?;
                (best.raw.clone(), best)
            }
        };

        let url = format!("{}/swap", self.base_url);
        let body = SwapRequestBody {
            sender: request.sender.to_string(),
            quote: &quote_payload,
            slippage_bps: request.slippage_bps,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let detail = response.text().await.unwrap_or_default();
            return Err(SwapError::BuildRejected {
                provider: PROVIDER.to_string(),
                reason: detail,
            });
        }
        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "router returned status {}",
                response.status()
            )));
        }

        let parsed: SwapResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("unexpected swap response: {}", e)))?;

        let mut commands = Vec::with_capacity(parsed.tx.move_calls.len());
        for call in parsed.tx.move_calls {
            let mut args = Vec::with_capacity(call.arguments.len());
            for argument in &call.arguments {
                args.push(BASE64.decode(argument).map_err(|e| {
                    SwapError::Serialization(format!("bad call argument encoding: {}", e))
                })?);
            }
            commands.push(MoveCall {
                package: call
                    .package
                    .parse()
                    .map_err(|e| SwapError::Serialization(format!("bad package id: {}", e)))?,
                module: call.module,
                function: call.function,
                type_args: call.type_arguments,
                args,
            });
        }

        realized.amount_out =
            parse_amount(&parsed.expected_amount_out, PROVIDER, "expectedAmountOut")?;
        realized.amount_in = request.amount_in;

        Ok(ProviderBuild {
            kind: TransactionKind::Programmable(ProgrammableBlock::new(commands)),
            realized,
        })
    }
}
