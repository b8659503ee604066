//! Accumulates pending operations into one combined signing ceremony

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chain::{Address, ProgrammableBlock, TransactionDigest, TransactionKind, UnsignedTransaction};
use crate::domain::execution::builder::FALLBACK_GAS_PRICE;
use crate::domain::execution::executor::ExecutionEngine;
use crate::domain::signing::{PasskeySigner, SigningPayload};
use crate::shared::errors::BatchError;
use crate::shared::types::{BatchedOperation, OperationKind};

/// Batch lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    Accumulating,
    ReadyToExecute,
}

/// Pushed to the subscriber when the debounce window closes. The caller
/// decides whether to execute or keep waiting for explicit confirmation;
/// the batcher never executes on its own.
#[derive(Debug, Clone)]
pub enum BatchNotification {
    ReadyToExecute { operations: usize },
}

struct BatchInner {
    operations: Vec<BatchedOperation>,
    state: BatchState,
    debounce_task: Option<JoinHandle<()>>,
}

/// Queues pre-built operations and merges them into a single combined
/// transaction so the user signs once instead of once per operation.
pub struct TransactionBatcher {
    inner: Arc<Mutex<BatchInner>>,
    events: mpsc::UnboundedSender<BatchNotification>,
    debounce: Duration,
    sender: Address,
    gas_budget: u64,
    engine: Arc<ExecutionEngine>,
}

impl TransactionBatcher {
    pub fn new(
        sender: Address,
        engine: Arc<ExecutionEngine>,
        debounce: Duration,
        gas_budget: u64,
    ) -> (Self, mpsc::UnboundedReceiver<BatchNotification>) {
        let (events, notifications) = mpsc::unbounded_channel();
        let batcher = Self {
            inner: Arc::new(Mutex::new(BatchInner {
                operations: Vec::new(),
                state: BatchState::Idle,
                debounce_task: None,
            })),
            events,
            debounce,
            sender,
            gas_budget,
            engine,
        };
        (batcher, notifications)
    }

    /// Queue an operation. Each add re-arms the debounce window: the
    /// previous timer is cancelled, never duplicated.
    pub fn add(&self, kind: OperationKind, tx_kind: TransactionKind) -> Uuid {
        let operation = BatchedOperation::new(kind, tx_kind);
        let id = operation.id;

        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(operation);
        inner.state = BatchState::Accumulating;
        if let Some(task) = inner.debounce_task.take() {
            task.abort();
        }
        inner.debounce_task = Some(self.spawn_debounce());
        debug!(
            "queued {} operation {}, batch size {}",
            kind.as_str(),
            id,
            inner.operations.len()
        );
        id
    }

    /// Remove a queued operation. Removing the last one returns the batch
    /// to idle and disarms the debounce timer.
    pub fn cancel(&self, id: Uuid) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.operations.len();
        inner.operations.retain(|op| op.id != id);
        let removed = inner.operations.len() != before;

        if inner.operations.is_empty() && removed {
            inner.state = BatchState::Idle;
            if let Some(task) = inner.debounce_task.take() {
                task.abort();
            }
        }
        removed
    }

    pub fn state(&self) -> BatchState {
        self.inner.lock().unwrap().state
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().operations.len()
    }

    /// Merge the queued operations into one transaction, obtain a single
    /// signature, and execute. The batch is cleared whether execution
    /// succeeds or fails.
    pub async fn execute(
        &self,
        signer: &dyn PasskeySigner,
    ) -> Result<Vec<TransactionDigest>, BatchError> {
        let operations = {
            let mut inner = self.inner.lock().unwrap();
            if let Some(task) = inner.debounce_task.take() {
                task.abort();
            }
            inner.state = BatchState::Idle;
            std::mem::take(&mut inner.operations)
        };

        if operations.is_empty() {
            return Err(BatchError::Empty);
        }

        let kind = merge_kinds(&operations)?;
        info!(
            "executing batch of {} operation(s) as one transaction",
            operations.len()
        );

        let gas_price = match self.engine.network().reference_gas_price().await {
            Ok(price) => price,
            Err(err) => {
                warn!(
                    "reference gas price unavailable ({}), using fallback {}",
                    err, FALLBACK_GAS_PRICE
                );
                FALLBACK_GAS_PRICE
            }
        };
        let gas_budget = self.gas_budget.saturating_mul(operations.len() as u64);

        let transaction = UnsignedTransaction::new(self.sender, kind, gas_price, gas_budget);
        let payload = SigningPayload::for_transaction(transaction).map_err(BatchError::Execution)?;
        let signature = signer
            .sign(&payload.digest)
            .await
            .map_err(BatchError::Execution)?;

        let result = self
            .engine
            .execute_signed(&payload.tx_bytes, &signature)
            .await
            .map_err(BatchError::Execution)?;

        if result.success {
            let digest = result.digest.ok_or_else(|| {
                BatchError::Execution(crate::shared::errors::SwapError::Rpc(
                    "finalized without a digest".to_string(),
                ))
            })?;
            Ok(vec![digest])
        } else {
            Err(BatchError::OnChainFailure {
                digest: result
                    .digest
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "unknown".to_string()),
                reason: result.error.unwrap_or_else(|| "aborted".to_string()),
            })
        }
    }

    fn spawn_debounce(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let events = self.events.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let mut inner = inner.lock().unwrap();
            if inner.state == BatchState::Accumulating && !inner.operations.is_empty() {
                inner.state = BatchState::ReadyToExecute;
                let _ = events.send(BatchNotification::ReadyToExecute {
                    operations: inner.operations.len(),
                });
            }
        })
    }
}

/// Combine operation payloads into one transaction kind. A single
/// operation passes through unchanged; multiple operations must all be
/// programmable blocks, which concatenate in queue order.
fn merge_kinds(operations: &[BatchedOperation]) -> Result<TransactionKind, BatchError> {
    if operations.len() == 1 {
        return Ok(operations[0].tx_kind.clone());
    }

    let mut commands = Vec::new();
    for operation in operations {
        match &operation.tx_kind {
            TransactionKind::Programmable(block) => {
                commands.extend(block.commands.iter().cloned());
            }
            TransactionKind::System(_) => {
                return Err(BatchError::Incompatible(format!(
                    "{} operation {} is a system transaction and cannot be combined",
                    operation.kind.as_str(),
                    operation.id
                )));
            }
        }
    }
    Ok(TransactionKind::Programmable(ProgrammableBlock::new(commands)))
}
