//! Swap building, fallback orchestration, execution, and batching

pub mod batcher;
pub mod builder;
pub mod executor;
pub mod fallback;
pub mod network;

#[cfg(test)]
pub mod mock;

pub use batcher::{BatchNotification, BatchState, TransactionBatcher};
pub use builder::{BuiltSwap, SwapBuilder};
pub use executor::ExecutionEngine;
pub use fallback::FallbackOrchestrator;
pub use network::{BalanceSource, CoinMetadataSource, NetworkExecutor};
