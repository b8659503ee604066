//! In-memory network and signer used by unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::chain::{Address, CoinMetadata, FinalityStatus, TokenId, TransactionDigest};
use crate::domain::execution::network::{BalanceSource, CoinMetadataSource, NetworkExecutor};
use crate::domain::signing::payload::blake2b256;
use crate::domain::signing::PasskeySigner;
use crate::shared::errors::SwapError;

/// How `wait_for_finality` behaves
pub enum WaitBehavior {
    /// Resolve immediately with the given status
    Resolve(FinalityStatus),
    /// Never resolve within any reasonable test window
    Hang,
}

/// Scriptable stand-in for the fullnode: balances, submissions, finality
pub struct MockNetwork {
    balances: Mutex<HashMap<String, u64>>,
    pub submitted: Mutex<Vec<(Vec<u8>, Vec<u8>)>>,
    submit_failure: Option<String>,
    wait_behavior: WaitBehavior,
    /// Successive answers for `status_by_digest` during reconciliation
    status_queue: Mutex<VecDeque<Option<FinalityStatus>>>,
    gas_price: u64,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            submit_failure: None,
            wait_behavior: WaitBehavior::Resolve(FinalityStatus::Finalized {
                success: true,
                error: None,
            }),
            status_queue: Mutex::new(VecDeque::new()),
            gas_price: 750,
        }
    }

    pub fn with_balance(self, token: &str, amount: u64) -> Self {
        self.balances.lock().unwrap().insert(token.to_string(), amount);
        self
    }

    pub fn failing_submit(mut self, reason: &str) -> Self {
        self.submit_failure = Some(reason.to_string());
        self
    }

    pub fn with_wait_behavior(mut self, behavior: WaitBehavior) -> Self {
        self.wait_behavior = behavior;
        self
    }

    pub fn with_status_answers(self, answers: Vec<Option<FinalityStatus>>) -> Self {
        *self.status_queue.lock().unwrap() = answers.into();
        self
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

#[async_trait]
impl BalanceSource for MockNetwork {
    async fn balance(&self, _owner: &Address, token: &TokenId) -> Result<u64, SwapError> {
        Ok(*self
            .balances
            .lock()
            .unwrap()
            .get(token.as_str())
            .unwrap_or(&0))
    }
}

#[async_trait]
impl CoinMetadataSource for MockNetwork {
    async fn coin_metadata(&self, token: &TokenId) -> Result<CoinMetadata, SwapError> {
        Ok(CoinMetadata {
            symbol: token.struct_name().to_string(),
            name: token.to_string(),
            decimals: 9,
            icon_url: None,
        })
    }
}

#[async_trait]
impl NetworkExecutor for MockNetwork {
    async fn submit(
        &self,
        tx_bytes: &[u8],
        signature: &[u8],
    ) -> Result<TransactionDigest, SwapError> {
        if let Some(reason) = &self.submit_failure {
            return Err(SwapError::SubmissionFailed(reason.clone()));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((tx_bytes.to_vec(), signature.to_vec()));
        Ok(TransactionDigest::new(blake2b256(tx_bytes)))
    }

    async fn wait_for_finality(
        &self,
        _digest: &TransactionDigest,
    ) -> Result<FinalityStatus, SwapError> {
        match &self.wait_behavior {
            WaitBehavior::Resolve(status) => Ok(status.clone()),
            WaitBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Ok(FinalityStatus::Pending)
            }
        }
    }

    async fn status_by_digest(
        &self,
        _digest: &TransactionDigest,
    ) -> Result<Option<FinalityStatus>, SwapError> {
        Ok(self.status_queue.lock().unwrap().pop_front().flatten())
    }

    async fn reference_gas_price(&self) -> Result<u64, SwapError> {
        Ok(self.gas_price)
    }
}

/// Signer that records every digest it is asked to sign
pub struct MockSigner {
    pub signed: Mutex<Vec<[u8; 32]>>,
    decline: Option<String>,
}

impl MockSigner {
    pub fn new() -> Self {
        Self {
            signed: Mutex::new(Vec::new()),
            decline: None,
        }
    }

    pub fn declining(reason: &str) -> Self {
        Self {
            signed: Mutex::new(Vec::new()),
            decline: Some(reason.to_string()),
        }
    }

    pub fn signature_count(&self) -> usize {
        self.signed.lock().unwrap().len()
    }
}

#[async_trait]
impl PasskeySigner for MockSigner {
    async fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>, SwapError> {
        if let Some(reason) = &self.decline {
            return Err(SwapError::SigningDeclined(reason.clone()));
        }
        self.signed.lock().unwrap().push(*digest);
        // Deterministic placeholder signature derived from the digest
        let mut signature = digest.to_vec();
        signature.extend_from_slice(digest);
        Ok(signature)
    }
}
