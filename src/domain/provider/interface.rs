//! Provider capability interface

use async_trait::async_trait;

use crate::chain::{Address, TokenId, TransactionKind};
use crate::shared::errors::SwapError;
use crate::shared::types::{ProviderId, Quote};

/// Parameters for building an executable swap transaction
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub sender: Address,
    pub token_in: TokenId,
    pub token_out: TokenId,
    pub amount_in: u64,
    pub slippage_bps: u32,
    /// Quote selected during aggregation, if one is being reused. A provider
    /// ignores quotes that did not originate from it and re-derives.
    pub quote: Option<Quote>,
}

/// Provider output of a successful build: the transaction payload plus the
/// realized trade parameters reported at build time.
#[derive(Debug, Clone)]
pub struct ProviderBuild {
    pub kind: TransactionKind,
    pub realized: Quote,
}

/// Common interface for all swap providers. One conforming implementation
/// exists per provider; call sites never branch on provider identity.
#[async_trait]
pub trait SwapProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetch candidate trade routes for a pair and input amount.
    ///
    /// An empty vec means the provider answered but holds no liquidity for
    /// the pair; that is a valid result, not an error.
    async fn get_quotes(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: u64,
    ) -> Result<Vec<Quote>, SwapError>;

    /// Build the provider-specific transaction payload for a request.
    async fn build_transaction(&self, request: &BuildRequest) -> Result<ProviderBuild, SwapError>;
}
