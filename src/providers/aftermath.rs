//! Aftermath router client

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::chain::{MoveCall, ProgrammableBlock, TokenId, TransactionKind};
use crate::domain::provider::{BuildRequest, ProviderBuild, SwapProvider};
use crate::providers::{impact_to_bps, parse_amount};
use crate::shared::errors::SwapError;
use crate::shared::types::{ProviderId, Quote, Route, RouteHop};

const PROVIDER: ProviderId = ProviderId::Aftermath;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TradeRouteRequest<'a> {
    coin_in_type: &'a str,
    coin_out_type: &'a str,
    coin_in_amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinAmount {
    #[serde(rename = "type")]
    coin_type: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradePath {
    pool_id: String,
    coin_in: CoinAmount,
    coin_out: CoinAmount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeRoute {
    portion: u8,
    paths: Vec<TradePath>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeRouteResponse {
    routes: Vec<TradeRoute>,
    coin_in: CoinAmount,
    coin_out: CoinAmount,
    #[serde(default)]
    price_impact: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TradeTxRequest<'a> {
    wallet_address: String,
    complete_route: &'a Value,
    slippage_bps: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeCommand {
    package_id: String,
    module: String,
    function: String,
    #[serde(default)]
    type_arguments: Vec<String>,
    #[serde(default)]
    arguments: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeTxResponse {
    commands: Vec<TradeCommand>,
    coin_out_amount: String,
}

/// Client for the Aftermath trade router
pub struct AftermathProvider {
    http_client: Client,
    base_url: String,
}

impl AftermathProvider {
    pub fn new(base_url: String, http_client: Client) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    fn map_response(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        response: TradeRouteResponse,
        raw: Value,
    ) -> Result<Quote, SwapError> {
        let mut routes = Vec::with_capacity(response.routes.len());
        for route in &response.routes {
            let mut hops = Vec::with_capacity(route.paths.len());
            for path in &route.paths {
                hops.push(RouteHop {
                    provider: PROVIDER,
                    venue: path.pool_id.clone(),
                    token_in: TokenId::new(path.coin_in.coin_type.clone()),
                    token_out: TokenId::new(path.coin_out.coin_type.clone()),
                    amount_in: parse_amount(&path.coin_in.amount, PROVIDER, "path coinIn")?,
                    amount_out: parse_amount(&path.coin_out.amount, PROVIDER, "path coinOut")?,
                });
            }
            routes.push(Route {
                percent: route.portion,
                hops,
            });
        }

        Ok(Quote {
            provider: PROVIDER,
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount_in: parse_amount(&response.coin_in.amount, PROVIDER, "coinIn")?,
            amount_out: parse_amount(&response.coin_out.amount, PROVIDER, "coinOut")?,
            routes,
            price_impact_bps: response
                .price_impact
                .as_deref()
                .map(impact_to_bps)
                .unwrap_or(0),
            raw,
        })
    }

    fn unavailable(reason: impl Into<String>) -> SwapError {
        SwapError::ProviderUnavailable {
            provider: PROVIDER.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SwapProvider for AftermathProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    async fn get_quotes(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: u64,
    ) -> Result<Vec<Quote>, SwapError> {
        let url = format!("{}/router/trade-route", self.base_url);
        let body = TradeRouteRequest {
            coin_in_type: token_in.as_str(),
            coin_out_type: token_out.as_str(),
            coin_in_amount: amount_in.to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        // 404 means the router holds no path for the pair: empty, not error
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            debug!("aftermath has no route for {} -> {}", token_in, token_out);
            return Ok(Vec::new());
        }
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
        let parsed: TradeRouteResponse = serde_json::from_value(raw.clone())
            .map_err(|e| Self::unavailable(format!("unexpected response shape: {}", e)))?;

        if parsed.routes.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![self.map_response(token_in, token_out, parsed, raw)?])
    }

    async fn build_transaction(&self, request: &BuildRequest) -> Result<ProviderBuild, SwapError> {
        // Reuse the aggregation-stage route when it came from this router;
        // anything else is re-derived fresh
        let (route_payload, mut realized) = match &request.quote {
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

        let url = format!("{}/router/transactions/trade", self.base_url);
        let body = TradeTxRequest {
            wallet_address: request.sender.to_string(),
            complete_route: &route_payload,
            slippage_bps: request.slippage_bps,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(SwapError::BuildRejected {
                provider: PROVIDER.to_string(),
                reason: format!("status {}: {}", status, detail),
            });
        }

        let parsed: TradeTxResponse = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("unexpected build response: {}", e)))?;

        let mut commands = Vec::with_capacity(parsed.commands.len());
        for command in parsed.commands {
            let mut args = Vec::with_capacity(command.arguments.len());
            for argument in &command.arguments {
                args.push(BASE64.decode(argument).map_err(|e| {
                    SwapError::Serialization(format!("bad command argument encoding: {}", e))
                })?);
            }
            commands.push(MoveCall {
                package: command.package_id.parse().map_err(|e| {
                    SwapError::Serialization(format!("bad package id: {}", e))
                })?,
                module: command.module,
                function: command.function,
                type_args: command.type_arguments,
                args,
            });
        }

        // The router reports the realized output at build time
        realized.amount_out = parse_amount(&parsed.coin_out_amount, PROVIDER, "coinOutAmount")?;
        realized.amount_in = request.amount_in;

        Ok(ProviderBuild {
            kind: TransactionKind::Programmable(ProgrammableBlock::new(commands)),
            realized,
        })
    }
}
