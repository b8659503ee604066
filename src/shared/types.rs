//! Common types used across the application

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::chain::{TokenId, TransactionDigest, TransactionKind};

/// Registered swap providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    Aftermath,
    Cetus,
    FlowX,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Aftermath => "aftermath",
            ProviderId::Cetus => "cetus",
            ProviderId::FlowX => "flowx",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aftermath" => Ok(ProviderId::Aftermath),
            "cetus" => Ok(ProviderId::Cetus),
            "flowx" | "flow-x" => Ok(ProviderId::FlowX),
            _ => Err(anyhow::anyhow!("Unknown provider: {}", s)),
        }
    }
}

/// One leg of a trade path through a liquidity venue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub provider: ProviderId,
    /// Pool or venue identifier, provider-native format
    pub venue: String,
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub amount_in: u64,
    pub amount_out: u64,
}

/// Ordered hop sequence carrying `percent` of the trade's total input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub percent: u8,
    pub hops: Vec<RouteHop>,
}

impl Route {
    /// Checks the chained-token invariant: each hop's output feeds the next
    /// hop's input, and the endpoints match the declared trade pair.
    pub fn validate(&self, token_in: &TokenId, token_out: &TokenId) -> Result<(), String> {
        let first = self.hops.first().ok_or("route has no hops")?;
        let last = self.hops.last().ok_or("route has no hops")?;

        if &first.token_in != token_in {
            return Err(format!(
                "route starts at {} instead of {}",
                first.token_in, token_in
            ));
        }
        if &last.token_out != token_out {
            return Err(format!(
                "route ends at {} instead of {}",
                last.token_out, token_out
            ));
        }
        for pair in self.hops.windows(2) {
            if pair[0].token_out != pair[1].token_in {
                return Err(format!(
                    "hop chain breaks at {} -> {}",
                    pair[0].token_out, pair[1].token_in
                ));
            }
        }
        Ok(())
    }
}

/// A provider's estimate for a trade. Immutable snapshot; comparable only
/// against quotes from the same aggregation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub provider: ProviderId,
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub amount_in: u64,
    pub amount_out: u64,
    pub routes: Vec<Route>,
    pub price_impact_bps: u32,
    /// Provider-native route payload, echoed back to the provider at build time
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl Quote {
    /// Validates every route and the split-percentage sum
    pub fn validate(&self) -> Result<(), String> {
        if self.routes.is_empty() {
            return Err("quote has no routes".to_string());
        }
        for route in &self.routes {
            route.validate(&self.token_in, &self.token_out)?;
        }
        let percent_total: u32 = self.routes.iter().map(|r| r.percent as u32).sum();
        if percent_total != 100 {
            return Err(format!("route percentages sum to {}", percent_total));
        }
        Ok(())
    }
}

/// Slippage tolerance and the derived floor on acceptable output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageConfig {
    pub tolerance_bps: u32,
    pub min_amount_out: u64,
}

impl SlippageConfig {
    /// Computes `floor(estimated_out * (1 - tolerance))` in exact integer
    /// arithmetic. `tolerance_bps` is clamped to 100%.
    pub fn from_estimate(estimated_out: u64, tolerance_bps: u32) -> Self {
        let bps = tolerance_bps.min(10_000);
        let min_amount_out =
            ((estimated_out as u128 * (10_000 - bps) as u128) / 10_000) as u64;
        Self {
            tolerance_bps: bps,
            min_amount_out,
        }
    }
}

/// Kinds of batched lending-market operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Supply,
    Withdraw,
    Borrow,
    Repay,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Supply => "supply",
            OperationKind::Withdraw => "withdraw",
            OperationKind::Borrow => "borrow",
            OperationKind::Repay => "repay",
        }
    }
}

/// A pre-built operation queued for combined execution
#[derive(Debug, Clone)]
pub struct BatchedOperation {
    pub id: Uuid,
    pub kind: OperationKind,
    pub tx_kind: TransactionKind,
}

impl BatchedOperation {
    pub fn new(kind: OperationKind, tx_kind: TransactionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            tx_kind,
        }
    }
}

/// Terminal outcome of a submitted transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub digest: Option<TransactionDigest>,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn ok(digest: TransactionDigest) -> Self {
        Self {
            success: true,
            digest: Some(digest),
            error: None,
        }
    }

    pub fn failed(digest: Option<TransactionDigest>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            digest,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(tag: &str) -> TokenId {
        TokenId::new(tag)
    }

    fn hop(token_in: &str, token_out: &str) -> RouteHop {
        RouteHop {
            provider: ProviderId::Aftermath,
            venue: "pool-1".to_string(),
            token_in: token(token_in),
            token_out: token(token_out),
            amount_in: 100,
            amount_out: 99,
        }
    }

    #[test]
    fn test_route_chain_invariant() {
        let route = Route {
            percent: 100,
            hops: vec![hop("0x2::a::A", "0x2::b::B"), hop("0x2::b::B", "0x2::c::C")],
        };
        assert!(route
            .validate(&token("0x2::a::A"), &token("0x2::c::C"))
            .is_ok());

        let broken = Route {
            percent: 100,
            hops: vec![hop("0x2::a::A", "0x2::b::B"), hop("0x2::x::X", "0x2::c::C")],
        };
        assert!(broken
            .validate(&token("0x2::a::A"), &token("0x2::c::C"))
            .is_err());
    }

    #[test]
    fn test_split_percentages_must_sum_to_100() {
        let quote = Quote {
            provider: ProviderId::Cetus,
            token_in: token("0x2::a::A"),
            token_out: token("0x2::b::B"),
            amount_in: 100,
            amount_out: 99,
            routes: vec![
                Route {
                    percent: 60,
                    hops: vec![hop("0x2::a::A", "0x2::b::B")],
                },
                Route {
                    percent: 30,
                    hops: vec![hop("0x2::a::A", "0x2::b::B")],
                },
            ],
            price_impact_bps: 10,
            raw: serde_json::Value::Null,
        };
        assert!(quote.validate().is_err());
    }

    #[test]
    fn test_slippage_floor_exact() {
        // 1% of 2_050_000 = 20_500
        let slippage = SlippageConfig::from_estimate(2_050_000, 100);
        assert_eq!(slippage.min_amount_out, 2_029_500);

        // Fractional result floors: 0.3% of 1001 -> 1001 * 9970 / 10000 = 997.997
        let slippage = SlippageConfig::from_estimate(1001, 30);
        assert_eq!(slippage.min_amount_out, 997);

        // Zero tolerance keeps the estimate; full tolerance floors to zero
        assert_eq!(SlippageConfig::from_estimate(500, 0).min_amount_out, 500);
        assert_eq!(SlippageConfig::from_estimate(500, 10_000).min_amount_out, 0);
    }

    #[test]
    fn test_slippage_tolerance_clamped() {
        let slippage = SlippageConfig::from_estimate(500, 20_000);
        assert_eq!(slippage.tolerance_bps, 10_000);
        assert_eq!(slippage.min_amount_out, 0);
    }
}
