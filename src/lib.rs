//! Tideway - swap orchestration and signing core for a Move-network wallet
//! Built with Domain-Driven Design principles

pub mod application;
pub mod chain;
pub mod domain;
pub mod infrastructure;
pub mod providers;
pub mod shared;

// Re-export main types for convenience
pub use application::{SwapRequest, SwapService};
pub use chain::{Address, TokenId, TransactionDigest, UnsignedTransaction};
pub use domain::execution::{BatchNotification, ExecutionEngine, TransactionBatcher};
pub use domain::provider::{ProviderRegistry, SwapProvider};
pub use domain::quote::QuoteAggregator;
pub use domain::signing::{PasskeySigner, SigningPayload};
pub use shared::config::WalletConfig;
pub use shared::errors::{BatchError, SwapError};
pub use shared::types::{ExecutionResult, ProviderId, Quote};
