//! Capability interfaces over the network's read and execution services

use async_trait::async_trait;

use crate::chain::{Address, CoinMetadata, FinalityStatus, TokenId, TransactionDigest};
use crate::shared::errors::SwapError;

/// Queryable on-chain balance per address and coin type
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn balance(&self, owner: &Address, token: &TokenId) -> Result<u64, SwapError>;
}

/// Coin metadata lookups (decimals, symbol, icon)
#[async_trait]
pub trait CoinMetadataSource: Send + Sync {
    async fn coin_metadata(&self, token: &TokenId) -> Result<CoinMetadata, SwapError>;
}

/// Transaction submission and finality tracking
#[async_trait]
pub trait NetworkExecutor: Send + Sync {
    /// Submit signed transaction bytes for execution
    async fn submit(
        &self,
        tx_bytes: &[u8],
        signature: &[u8],
    ) -> Result<TransactionDigest, SwapError>;

    /// Block until the network reports the transaction finalized
    async fn wait_for_finality(
        &self,
        digest: &TransactionDigest,
    ) -> Result<FinalityStatus, SwapError>;

    /// Re-query status by digest; `None` when the network has no record yet
    async fn status_by_digest(
        &self,
        digest: &TransactionDigest,
    ) -> Result<Option<FinalityStatus>, SwapError>;

    /// Current reference gas price
    async fn reference_gas_price(&self) -> Result<u64, SwapError>;
}
