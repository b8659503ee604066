//! Error handling for the application

use thiserror::Error;

use crate::chain::TransactionDigest;

/// Swap pipeline errors: quoting, building, signing, execution
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Provider {provider} found no route for the pair")]
    NoRoute { provider: String },

    #[error("No routes found across any provider")]
    NoRoutesFound,

    #[error("Quote request superseded by a newer request")]
    SupersededRequest,

    #[error("Build timed out after {seconds}s on provider {provider}")]
    BuildTimeout { provider: String, seconds: u64 },

    #[error("Provider {provider} rejected the build: {reason}")]
    BuildRejected { provider: String, reason: String },

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("All providers failed, last error: {last_error}")]
    AllProvidersFailed { last_error: String },

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Confirmation timed out for transaction {digest}")]
    ConfirmationTimeout { digest: TransactionDigest },

    #[error("Signing declined: {0}")]
    SigningDeclined(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl From<bcs::Error> for SwapError {
    fn from(err: bcs::Error) -> Self {
        SwapError::Serialization(err.to_string())
    }
}

/// Batch lifecycle errors
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Batch holds no operations")]
    Empty,

    #[error("Operations cannot be combined: {0}")]
    Incompatible(String),

    #[error("Combined transaction {digest} failed on-chain: {reason}")]
    OnChainFailure { digest: String, reason: String },

    #[error("Batch execution failed: {0}")]
    Execution(#[from] SwapError),
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Swap error: {0}")]
    SwapError(String),

    #[error("Batch error: {0}")]
    BatchError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<SwapError> for AppError {
    fn from(err: SwapError) -> Self {
        AppError::SwapError(err.to_string())
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        AppError::BatchError(err.to_string())
    }
}
