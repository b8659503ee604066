//! Builds an unsigned transaction from a chosen quote

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::chain::UnsignedTransaction;
use crate::domain::execution::network::{BalanceSource, NetworkExecutor};
use crate::domain::provider::{BuildRequest, SwapProvider};
use crate::shared::errors::SwapError;
use crate::shared::types::{Quote, SlippageConfig};

/// Used when the reference gas price cannot be fetched
pub const FALLBACK_GAS_PRICE: u64 = 1_000;

/// A build's output: the unsigned transaction plus the trade parameters
/// recomputed from what the provider realized at build time.
#[derive(Debug, Clone)]
pub struct BuiltSwap {
    pub transaction: UnsignedTransaction,
    pub quote: Quote,
    pub slippage: SlippageConfig,
}

/// Turns a build request into an `UnsignedTransaction` via one provider.
///
/// The sender's balance is checked before the provider is invoked, so an
/// underfunded request can never reach a signing ceremony. The provider
/// build itself races a fixed wall-clock deadline.
pub struct SwapBuilder {
    balance: Arc<dyn BalanceSource>,
    network: Arc<dyn NetworkExecutor>,
    build_timeout: Duration,
    gas_budget: u64,
}

impl SwapBuilder {
    pub fn new(
        balance: Arc<dyn BalanceSource>,
        network: Arc<dyn NetworkExecutor>,
        build_timeout: Duration,
        gas_budget: u64,
    ) -> Self {
        Self {
            balance,
            network,
            build_timeout,
            gas_budget,
        }
    }

    pub async fn build(
        &self,
        provider: Arc<dyn SwapProvider>,
        request: &BuildRequest,
    ) -> Result<BuiltSwap, SwapError> {
        let available = self
            .balance
            .balance(&request.sender, &request.token_in)
            .await?;
        if available < request.amount_in {
            return Err(SwapError::InsufficientBalance {
                required: request.amount_in,
                available,
            });
        }

        let provider_id = provider.id();
        debug!(
            "building swap via {}: {} -> {} amount {}",
            provider_id, request.token_in, request.token_out, request.amount_in
        );

        let build = tokio::time::timeout(self.build_timeout, provider.build_transaction(request))
            .await
            .map_err(|_| SwapError::BuildTimeout {
                provider: provider_id.to_string(),
                seconds: self.build_timeout.as_secs(),
            })??;

        // Recomputed from the realized build output, not echoed from the
        // quote stage: providers may adjust amounts when constructing.
        let slippage = SlippageConfig::from_estimate(build.realized.amount_out, request.slippage_bps);

        let gas_price = match self.network.reference_gas_price().await {
            Ok(price) => price,
            Err(err) => {
                warn!(
                    "reference gas price unavailable ({}), using fallback {}",
                    err, FALLBACK_GAS_PRICE
                );
                FALLBACK_GAS_PRICE
            }
        };

        let transaction =
            UnsignedTransaction::new(request.sender, build.kind, gas_price, self.gas_budget);

        Ok(BuiltSwap {
            transaction,
            quote: build.realized,
            slippage,
        })
    }
}
