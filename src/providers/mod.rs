//! Concrete swap provider clients
//!
//! One module per provider, each mapping its native API schema into the
//! common quote shape. New providers register here and nowhere else.

pub mod aftermath;
pub mod cetus;
pub mod flowx;

use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::domain::provider::ProviderRegistry;
use crate::shared::config::ProviderEndpoints;
use crate::shared::errors::SwapError;
use crate::shared::types::ProviderId;

pub use aftermath::AftermathProvider;
pub use cetus::CetusProvider;
pub use flowx::FlowXProvider;

/// Build the provider registry in configured order. Unknown names in the
/// order list are skipped with a warning rather than failing startup.
pub fn build_registry(config: &ProviderEndpoints, client: &reqwest::Client) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    for name in &config.order {
        let id = match ProviderId::from_str(name) {
            Ok(id) => id,
            Err(_) => {
                warn!("unknown provider '{}' in configured order, skipping", name);
                continue;
            }
        };
        match id {
            ProviderId::Aftermath => registry.register(Arc::new(AftermathProvider::new(
                config.aftermath_url.clone(),
                client.clone(),
            ))),
            ProviderId::Cetus => registry.register(Arc::new(CetusProvider::new(
                config.cetus_url.clone(),
                client.clone(),
            ))),
            ProviderId::FlowX => registry.register(Arc::new(FlowXProvider::new(
                config.flowx_url.clone(),
                client.clone(),
            ))),
        }
    }
    registry
}

/// Parse a provider-native string-encoded integer amount without going
/// through floating point.
pub(crate) fn parse_amount(
    value: &str,
    provider: ProviderId,
    field: &str,
) -> Result<u64, SwapError> {
    value
        .parse::<u64>()
        .map_err(|_| SwapError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: format!("non-numeric {}: {}", field, value),
        })
}

/// Convert a fractional price-impact string (e.g. "0.0012") to basis points
pub(crate) fn impact_to_bps(value: &str) -> u32 {
    value
        .parse::<f64>()
        .map(|fraction| (fraction * 10_000.0).round().max(0.0) as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_rejects_floats() {
        assert!(parse_amount("1000000", ProviderId::Cetus, "amount").is_ok());
        assert!(parse_amount("1000000.5", ProviderId::Cetus, "amount").is_err());
        assert!(parse_amount("1e6", ProviderId::Cetus, "amount").is_err());
    }

    #[test]
    fn test_impact_to_bps() {
        assert_eq!(impact_to_bps("0.0012"), 12);
        assert_eq!(impact_to_bps("0.05"), 500);
        assert_eq!(impact_to_bps("garbage"), 0);
    }
}
