//! Cetus aggregator client

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

const PROVIDER: ProviderId = ProviderId::Cetus;

/// Status code the aggregator uses for "no path between these coins"
const CODE_NO_PATH: i64 = 10001;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PathStep {
    pool: String,
    from: String,
    target: String,
    amount_in: String,
    amount_out: String,
}

#[derive(Debug, Deserialize)]
struct SplitPath {
    percent: u8,
    path: Vec<PathStep>,
}

#[derive(Debug, Deserialize)]
struct FindRoutesData {
    amount_in: String,
    amount_out: String,
    #[serde(default)]
    price_impact: Option<String>,
    split_paths: Vec<SplitPath>,
}

#[derive(Debug, Serialize)]
struct BuildTxRequest<'a> {
    sender: String,
    route: &'a Value,
    slippage_bps: u32,
}

#[derive(Debug, Deserialize)]
struct TxCall {
    package: String,
    module: String,
    function: String,
    #[serde(default)]
    type_args: Vec<String>,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BuildTxData {
    calls: Vec<TxCall>,
    amount_out: String,
}

/// Client for the Cetus smart-router aggregator
pub struct CetusProvider {
    http_client: Client,
    base_url: String,
}

impl CetusProvider {
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

    fn map_data(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        data: FindRoutesData,
        raw: Value,
    ) -> Result<Quote, SwapError> {
        let mut routes = Vec::with_capacity(data.split_paths.len());
        for split in &data.split_paths {
            let mut hops = Vec::with_capacity(split.path.len());
            for step in &split.path {
                hops.push(RouteHop {
                    provider: PROVIDER,
                    venue: step.pool.clone(),
                    token_in: TokenId::new(step.from.clone()),
                    token_out: TokenId::new(step.target.clone()),
                    amount_in: parse_amount(&step.amount_in, PROVIDER, "step amount_in")?,
                    amount_out: parse_amount(&step.amount_out, PROVIDER, "step amount_out")?,
                });
            }
            routes.push(Route {
                percent: split.percent,
                hops,
            });
        }

        Ok(Quote {
            provider: PROVIDER,
            token_in: token_in.clone(),
            token_out: token_out.clone(),
            amount_in: parse_amount(&data.amount_in, PROVIDER, "amount_in")?,
            amount_out: parse_amount(&data.amount_out, PROVIDER, "amount_out")?,
            routes,
            price_impact_bps: data.price_impact.as_deref().map(impact_to_bps).unwrap_or(0),
            raw,
        })
    }
}

#[async_trait]
impl SwapProvider for CetusProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    async fn get_quotes(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: u64,
    ) -> Result<Vec<Quote>, SwapError> {
        let url = format!("{}/router_v2/find_routes", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("from", token_in.as_str()),
                ("target", token_out.as_str()),
                ("amount", &amount_in.to_string()),
                ("by_amount_in", "true"),
            ])
            .send()
            .await
            .map_err(|e| Self::unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::unavailable(format!(
                "aggregator returned status {}",
                response.status()
            )));
        }

        let envelope: Envelope<Value> = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("undecodable response: {}", e)))?;

        if envelope.code == CODE_NO_PATH {
            debug!("cetus reports no path for {} -> {}", token_in, token_out);
            return Err(SwapError::NoRoute {
                provider: PROVIDER.to_string(),
            });
        }
        if envelope.code != 200 {
            return Err(Self::unavailable(format!(
                "aggregator code {}: {}",
                envelope.code, envelope.msg
            )));
        }

        let raw = envelope.data.unwrap_or(Value::Null);
        let data: FindRoutesData = serde_json::from_value(raw.clone())
            .map_err(|e| Self::unavailable(format!("unexpected response shape: {}", e)))?;

        if data.split_paths.is_empty() {
            // Answered, just holds no liquidity for the pair
            return Ok(Vec::new());
        }
        Ok(vec![self.map_data(token_in, token_out, data, raw)?])
    }

    async fn build_transaction(&self, request: &BuildRequest) -> Result<ProviderBuild, SwapError> {
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

        let url = format!("{}/router_v2/build_tx", self.base_url);
        let body = BuildTxRequest {
            sender: request.sender.to_string(),
            route: &route_payload,
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
            return Err(Self::unavailable(format!(
                "aggregator returned status {}",
                response.status()
            )));
        }

        let envelope: Envelope<BuildTxData> = response
            .json()
            .await
            .map_err(|e| Self::unavailable(format!("undecodable build response: {}", e)))?;

        if envelope.code != 200 {
            return Err(SwapError::BuildRejected {
                provider: PROVIDER.to_string(),
                reason: format!("code {}: {}", envelope.code, envelope.msg),
            });
        }
        let data = envelope.data.ok_or_else(|| {
            Self::unavailable("build response carried no data".to_string())
        })?;

        let mut commands = Vec::with_capacity(data.calls.len());
        for call in data.calls {
            let mut args = Vec::with_capacity(call.args.len());
            for argument in &call.args {
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
                type_args: call.type_args,
                args,
            });
        }

        realized.amount_out = parse_amount(&data.amount_out, PROVIDER, "amount_out")?;
        realized.amount_in = request.amount_in;

        Ok(ProviderBuild {
            kind: TransactionKind::Programmable(ProgrammableBlock::new(commands)),
            realized,
        })
    }
}
