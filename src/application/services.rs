//! Application service wiring the swap pipeline together

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use crate::chain::{Address, CoinMetadata, TokenId, UnsignedTransaction};
use crate::domain::execution::{
    BalanceSource, BatchNotification, BuiltSwap, CoinMetadataSource, ExecutionEngine,
    FallbackOrchestrator, NetworkExecutor, SwapBuilder, TransactionBatcher,
};
use crate::domain::provider::{BuildRequest, ProviderRegistry};
use crate::domain::quote::QuoteAggregator;
use crate::domain::signing::{PasskeySigner, SigningPayload};
use crate::infrastructure::fullnode;
use crate::infrastructure::token_registry::TokenRegistryCache;
use crate::providers::build_registry;
use crate::shared::config::WalletConfig;
use crate::shared::errors::SwapError;
use crate::shared::types::{ExecutionResult, ProviderId, Quote};

/// A caller-facing swap request. Slippage falls back to the configured
/// default when not given.
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub amount_in: u64,
    pub slippage_bps: Option<u32>,
    pub preferred_provider: ProviderId,
    /// Quote chosen during aggregation, if the caller kept one
    pub quote: Option<Quote>,
}

/// Facade over the swap orchestration core, bound to one active session
/// address. UI layers call this and nothing below it.
pub struct SwapService {
    sender: Address,
    aggregator: QuoteAggregator,
    builder: SwapBuilder,
    orchestrator: FallbackOrchestrator,
    engine: Arc<ExecutionEngine>,
    batcher: TransactionBatcher,
    tokens: Arc<TokenRegistryCache>,
    metadata: Arc<dyn CoinMetadataSource>,
    registry: Arc<ProviderRegistry>,
    default_slippage_bps: u32,
    build_timeout: Duration,
}

impl SwapService {
    /// Wire the service against explicit collaborators. Used directly by
    /// tests; production callers go through [`SwapService::with_fullnode`].
    pub fn new(
        config: &WalletConfig,
        sender: Address,
        registry: ProviderRegistry,
        balance: Arc<dyn BalanceSource>,
        network: Arc<dyn NetworkExecutor>,
        metadata: Arc<dyn CoinMetadataSource>,
        tokens: Arc<TokenRegistryCache>,
    ) -> (Self, mpsc::UnboundedReceiver<BatchNotification>) {
        let registry = Arc::new(registry);
        let build_timeout = Duration::from_secs(config.swap.build_timeout_secs);

        let aggregator = QuoteAggregator::new(
            Arc::clone(&registry),
            Duration::from_millis(config.swap.quote_timeout_ms),
        );
        let builder = SwapBuilder::new(
            balance,
            Arc::clone(&network),
            build_timeout,
            config.network.gas_budget,
        );
        let orchestrator = FallbackOrchestrator::new(Arc::clone(&registry));
        let engine = Arc::new(ExecutionEngine::new(
            network,
            Duration::from_secs(config.execution.confirm_timeout_secs),
            config.execution.reconcile_attempts,
            Duration::from_millis(config.execution.reconcile_interval_ms),
        ));
        let (batcher, notifications) = TransactionBatcher::new(
            sender,
            Arc::clone(&engine),
            Duration::from_millis(config.batch.debounce_ms),
            config.network.gas_budget,
        );

        let service = Self {
            sender,
            aggregator,
            builder,
            orchestrator,
            engine,
            batcher,
            tokens,
            metadata,
            registry,
            default_slippage_bps: config.swap.default_slippage_bps,
            build_timeout,
        };
        (service, notifications)
    }

    /// Production wiring: the process-wide fullnode client plus the
    /// configured provider set.
    pub fn with_fullnode(
        config: &WalletConfig,
        sender: Address,
    ) -> (Self, mpsc::UnboundedReceiver<BatchNotification>) {
        let client = fullnode::global(&config.network);
        let http_client = reqwest::Client::new();
        let registry = build_registry(&config.providers, &http_client);
        let tokens = Arc::new(TokenRegistryCache::new(
            config.registry.token_registry_url.clone(),
            config.registry.cache_ttl_secs,
            http_client,
        ));
        Self::new(
            config,
            sender,
            registry,
            client.clone(),
            client.clone(),
            client,
            tokens,
        )
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        self.registry.ids()
    }

    pub fn token_registry(&self) -> Arc<TokenRegistryCache> {
        Arc::clone(&self.tokens)
    }

    pub fn batcher(&self) -> &TransactionBatcher {
        &self.batcher
    }

    /// Coin metadata for display layers (decimals, symbol, icon)
    pub async fn coin_metadata(&self, token: &TokenId) -> Result<CoinMetadata, SwapError> {
        self.metadata.coin_metadata(token).await
    }

    /// Aggregate quotes for a pair, best output first
    pub async fn get_quotes(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: u64,
    ) -> Result<Vec<Quote>, SwapError> {
        self.aggregator
            .get_quotes(token_in, token_out, amount_in)
            .await
    }

    /// Build an unsigned swap transaction, falling back across providers
    pub async fn build_swap(&self, request: SwapRequest) -> Result<BuiltSwap, SwapError> {
        let build_request = BuildRequest {
            sender: self.sender,
            token_in: request.token_in,
            token_out: request.token_out,
            amount_in: request.amount_in,
            slippage_bps: request.slippage_bps.unwrap_or(self.default_slippage_bps),
            quote: request.quote,
        };
        self.orchestrator
            .build_with_fallback(&self.builder, request.preferred_provider, &build_request)
            .await
    }

    /// Serialize a built transaction into the exact bytes and digest the
    /// external signer consumes. Raced against the build deadline like any
    /// other transaction-construction step.
    pub async fn prepare_for_signing(
        &self,
        transaction: UnsignedTransaction,
    ) -> Result<SigningPayload, SwapError> {
        let deadline = self.build_timeout;
        tokio::time::timeout(deadline, async move {
            SigningPayload::for_transaction(transaction)
        })
        .await
        .map_err(|_| {
            SwapError::Serialization(format!(
                "serialization exceeded {}s deadline",
                deadline.as_secs()
            ))
        })?
    }

    /// Submit signed bytes and wait for finality
    pub async fn execute_signed(
        &self,
        tx_bytes: &[u8],
        signature: &[u8],
    ) -> Result<ExecutionResult, SwapError> {
        self.engine.execute_signed(tx_bytes, signature).await
    }

    /// Full pipeline: build, prepare, sign, execute
    pub async fn swap(
        &self,
        request: SwapRequest,
        signer: &dyn PasskeySigner,
    ) -> Result<ExecutionResult, SwapError> {
        let built = self.build_swap(request).await?;
        info!(
            "swap built via {}: {} in -> {} out (min {})",
            built.quote.provider,
            built.quote.amount_in,
            built.quote.amount_out,
            built.slippage.min_amount_out
        );
        let payload = self.prepare_for_signing(built.transaction).await?;
        let signature = signer.sign(&payload.digest).await?;
        self.execute_signed(&payload.tx_bytes, &signature).await
    }
}
