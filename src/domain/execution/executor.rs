//! Submission and finality tracking for signed transactions

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::chain::{FinalityStatus, TransactionDigest};
use crate::domain::execution::network::NetworkExecutor;
use crate::shared::errors::SwapError;
use crate::shared::types::ExecutionResult;

/// Submits signed transactions and waits for finality, with a bounded
/// reconciliation pass when confirmation does not arrive in time. A
/// confirmation timeout does not mean the transaction failed on-chain, so
/// the digest is re-queried before the ambiguity is surfaced.
pub struct ExecutionEngine {
    network: Arc<dyn NetworkExecutor>,
    confirm_timeout: Duration,
    reconcile_attempts: u32,
    reconcile_interval: Duration,
}

impl ExecutionEngine {
    pub fn new(
        network: Arc<dyn NetworkExecutor>,
        confirm_timeout: Duration,
        reconcile_attempts: u32,
        reconcile_interval: Duration,
    ) -> Self {
        Self {
            network,
            confirm_timeout,
            reconcile_attempts,
            reconcile_interval,
        }
    }

    pub fn network(&self) -> Arc<dyn NetworkExecutor> {
        Arc::clone(&self.network)
    }

    /// Submit signed bytes and block until finality or timeout.
    pub async fn execute_signed(
        &self,
        tx_bytes: &[u8],
        signature: &[u8],
    ) -> Result<ExecutionResult, SwapError> {
        let digest = self
            .network
            .submit(tx_bytes, signature)
            .await
            .map_err(|err| SwapError::SubmissionFailed(err.to_string()))?;
        info!("transaction {} submitted, awaiting finality", digest);

        match tokio::time::timeout(
            self.confirm_timeout,
            self.network.wait_for_finality(&digest),
        )
        .await
        {
            Ok(Ok(FinalityStatus::Finalized { success, error })) => {
                Ok(Self::finalized_result(digest, success, error))
            }
            Ok(Ok(FinalityStatus::Pending)) => {
                debug!("{} still pending after finality wait", digest);
                self.reconcile(digest).await
            }
            Ok(Err(err)) => {
                warn!("finality wait for {} errored: {}", digest, err);
                self.reconcile(digest).await
            }
            Err(_) => {
                warn!(
                    "finality wait for {} exceeded {}s",
                    digest,
                    self.confirm_timeout.as_secs()
                );
                self.reconcile(digest).await
            }
        }
    }

    /// Bounded re-query by digest. Finding a terminal status late converts
    /// an ambiguous timeout into a definite result.
    async fn reconcile(&self, digest: TransactionDigest) -> Result<ExecutionResult, SwapError> {
        for attempt in 1..=self.reconcile_attempts {
            tokio::time::sleep(self.reconcile_interval).await;
            match self.network.status_by_digest(&digest).await {
                Ok(Some(FinalityStatus::Finalized { success, error })) => {
                    info!(
                        "{} resolved on reconcile attempt {}/{}",
                        digest, attempt, self.reconcile_attempts
                    );
                    return Ok(Self::finalized_result(digest, success, error));
                }
                Ok(Some(FinalityStatus::Pending)) | Ok(None) => {
                    debug!(
                        "{} unresolved on reconcile attempt {}/{}",
                        digest, attempt, self.reconcile_attempts
                    );
                }
                Err(err) => {
                    warn!("reconcile query for {} failed: {}", digest, err);
                }
            }
        }
        Err(SwapError::ConfirmationTimeout { digest })
    }

    fn finalized_result(
        digest: TransactionDigest,
        success: bool,
        error: Option<String>,
    ) -> ExecutionResult {
        if success {
            ExecutionResult::ok(digest)
        } else {
            ExecutionResult::failed(
                Some(digest),
                error.unwrap_or_else(|| "transaction aborted".to_string()),
            )
        }
    }
}
