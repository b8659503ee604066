//! Ordered provider fallback for transaction builds

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::execution::builder::{BuiltSwap, SwapBuilder};
use crate::domain::provider::{BuildRequest, ProviderRegistry};
use crate::shared::errors::SwapError;
use crate::shared::types::ProviderId;

/// Drives the swap builder across providers one at a time: the preferred
/// provider first, then the remaining registered providers in order.
/// Sequential on purpose: provider builds run remote simulations, and
/// speculative concurrent builds burn quota for attempts that are thrown
/// away.
pub struct FallbackOrchestrator {
    registry: Arc<ProviderRegistry>,
}

impl FallbackOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Deduplicated attempt order: preferred first, then registration order
    /// with the preferred entry removed.
    pub fn attempt_order(&self, preferred: ProviderId) -> Vec<ProviderId> {
        let mut order = vec![preferred];
        for id in self.registry.ids() {
            if id != preferred {
                order.push(id);
            }
        }
        order
    }

    /// Try each candidate provider until one build succeeds. Balance
    /// shortfalls abort immediately: no provider can fix an underfunded
    /// sender. If every candidate fails, the last error is surfaced;
    /// earlier ones remain in the logs.
    pub async fn build_with_fallback(
        &self,
        builder: &SwapBuilder,
        preferred: ProviderId,
        request: &BuildRequest,
    ) -> Result<BuiltSwap, SwapError> {
        let order = self.attempt_order(preferred);
        let mut last_error: Option<SwapError> = None;

        for id in order {
            let Some(provider) = self.registry.get(id) else {
                warn!("provider {} not registered, skipping", id);
                continue;
            };

            match builder.build(provider, request).await {
                Ok(built) => {
                    info!("swap built via {}", id);
                    return Ok(built);
                }
                Err(err @ SwapError::InsufficientBalance { .. }) => return Err(err),
                Err(err) => {
                    warn!("build via {} failed, trying next provider: {}", id, err);
                    last_error = Some(err);
                }
            }
        }

        let last_error = last_error
            .map(|err| err.to_string())
            .unwrap_or_else(|| "no providers registered".to_string());
        Err(SwapError::AllProvidersFailed { last_error })
    }
}
