//! End-to-end tests driving the swap service against in-memory
//! providers, network, and signer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use tideway::chain::{
    Address, CoinMetadata, FinalityStatus, MoveCall, ProgrammableBlock, TokenId,
    TransactionDigest, TransactionKind,
};
use tideway::domain::execution::{
    BalanceSource, BatchNotification, CoinMetadataSource, NetworkExecutor,
};
use tideway::domain::provider::{BuildRequest, ProviderBuild, ProviderRegistry, SwapProvider};
use tideway::domain::signing::payload::{blake2b256, INTENT_PREFIX};
use tideway::domain::signing::PasskeySigner;
use tideway::infrastructure::token_registry::TokenRegistryCache;
use tideway::shared::config::WalletConfig;
use tideway::shared::errors::SwapError;
use tideway::shared::types::{OperationKind, ProviderId, Quote, Route, RouteHop};
use tideway::{SwapRequest, SwapService};

const TOKEN_IN: &str = "0x2::native::NATIVE";
const TOKEN_OUT: &str = "0x5::usd::USD";

fn quote(provider: ProviderId, amount_in: u64, amount_out: u64) -> Quote {
    let token_in: TokenId = TOKEN_IN.into();
    let token_out: TokenId = TOKEN_OUT.into();
    Quote {
        provider,
        token_in: token_in.clone(),
        token_out: token_out.clone(),
        amount_in,
        amount_out,
        routes: vec![Route {
            percent: 100,
            hops: vec![RouteHop {
                provider,
                venue: format!("{}-pool", provider),
                token_in,
                token_out,
                amount_in,
                amount_out,
            }],
        }],
        price_impact_bps: 9,
        raw: serde_json::Value::Null,
    }
}

fn swap_kind(provider: ProviderId) -> TransactionKind {
    TransactionKind::Programmable(ProgrammableBlock::new(vec![MoveCall {
        package: Address::new([7u8; 32]),
        module: "router".to_string(),
        function: format!("swap_via_{}", provider),
        type_args: vec![TOKEN_IN.to_string(), TOKEN_OUT.to_string()],
        args: vec![],
    }]))
}

/// Provider with canned behavior
struct LocalProvider {
    id: ProviderId,
    quotes: Vec<Quote>,
    quote_delay: Option<Duration>,
    build_fails: Option<String>,
}

impl LocalProvider {
    fn new(id: ProviderId) -> Self {
        Self {
            id,
            quotes: Vec::new(),
            quote_delay: None,
            build_fails: None,
        }
    }

    fn quoting(mut self, quote: Quote) -> Self {
        self.quotes.push(quote);
        self
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.quote_delay = Some(delay);
        self
    }

    fn rejecting_builds(mut self, reason: &str) -> Self {
        self.build_fails = Some(reason.to_string());
        self
    }
}

#[async_trait]
impl SwapProvider for LocalProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn get_quotes(
        &self,
        _token_in: &TokenId,
        _token_out: &TokenId,
        _amount_in: u64,
    ) -> Result<Vec<Quote>, SwapError> {
        if let Some(delay) = self.quote_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.quotes.clone())
    }

    async fn build_transaction(&self, request: &BuildRequest) -> Result<ProviderBuild, SwapError> {
        if let Some(reason) = &self.build_fails {
            return Err(SwapError::BuildRejected {
                provider: self.id.to_string(),
                reason: reason.clone(),
            });
        }
        let mut realized = self
            .quotes
            .first()
            .cloned()
            .unwrap_or_else(|| quote(self.id, request.amount_in, request.amount_in / 2));
        realized.amount_in = request.amount_in;
        Ok(ProviderBuild {
            kind: swap_kind(self.id),
            realized,
        })
    }
}

/// Network that actually verifies signatures: a submission only finalizes
/// successfully when the signature matches the transaction's signing digest.
struct LocalNetwork {
    balance: u64,
    submissions: Mutex<Vec<(Vec<u8>, Vec<u8>)>>,
}

impl LocalNetwork {
    fn new(balance: u64) -> Self {
        Self {
            balance,
            submissions: Mutex::new(Vec::new()),
        }
    }

    fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    fn expected_signature(tx_bytes: &[u8]) -> Vec<u8> {
        let mut message = INTENT_PREFIX.to_vec();
        message.extend_from_slice(tx_bytes);
        let digest = blake2b256(&message);
        let mut signature = digest.to_vec();
        signature.extend_from_slice(&digest);
        signature
    }
}

#[async_trait]
impl BalanceSource for LocalNetwork {
    async fn balance(&self, _owner: &Address, _token: &TokenId) -> Result<u64, SwapError> {
        Ok(self.balance)
    }
}

#[async_trait]
impl CoinMetadataSource for LocalNetwork {
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
impl NetworkExecutor for LocalNetwork {
    async fn submit(
        &self,
        tx_bytes: &[u8],
        signature: &[u8],
    ) -> Result<TransactionDigest, SwapError> {
        self.submissions
            .lock()
            .unwrap()
            .push((tx_bytes.to_vec(), signature.to_vec()));
        // Digest derivation is deterministic so tests can cross-check
        let mut tagged = tx_bytes.to_vec();
        tagged.extend_from_slice(signature);
        Ok(TransactionDigest::new(blake2b256(&tagged)))
    }

    async fn wait_for_finality(
        &self,
        _digest: &TransactionDigest,
    ) -> Result<FinalityStatus, SwapError> {
        let submissions = self.submissions.lock().unwrap();
        let Some((tx_bytes, signature)) = submissions.last() else {
            return Ok(FinalityStatus::Pending);
        };
        if signature == &Self::expected_signature(tx_bytes) {
            Ok(FinalityStatus::Finalized {
                success: true,
                error: None,
            })
        } else {
            Ok(FinalityStatus::Finalized {
                success: false,
                error: Some("signature verification failed".to_string()),
            })
        }
    }

    async fn status_by_digest(
        &self,
        _digest: &TransactionDigest,
    ) -> Result<Option<FinalityStatus>, SwapError> {
        Ok(None)
    }

    async fn reference_gas_price(&self) -> Result<u64, SwapError> {
        Ok(750)
    }
}

/// Signer producing the signature `LocalNetwork` expects
struct LocalSigner {
    signed: Mutex<Vec<[u8; 32]>>,
}

impl LocalSigner {
    fn new() -> Self {
        Self {
            signed: Mutex::new(Vec::new()),
        }
    }

    fn signature_count(&self) -> usize {
        self.signed.lock().unwrap().len()
    }
}

#[async_trait]
impl PasskeySigner for LocalSigner {
    async fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>, SwapError> {
        self.signed.lock().unwrap().push(*digest);
        let mut signature = digest.to_vec();
        signature.extend_from_slice(digest);
        Ok(signature)
    }
}

/// Signer that produces bytes over the wrong payload
struct CorruptSigner;

#[async_trait]
impl PasskeySigner for CorruptSigner {
    async fn sign(&self, _digest: &[u8; 32]) -> Result<Vec<u8>, SwapError> {
        Ok(vec![0u8; 64])
    }
}

fn test_config() -> WalletConfig {
    let mut config = WalletConfig::default();
    config.swap.quote_timeout_ms = 200;
    config.execution.confirm_timeout_secs = 2;
    config.execution.reconcile_attempts = 1;
    config.execution.reconcile_interval_ms = 10;
    config.batch.debounce_ms = 100;
    config
}

fn service_with(
    providers: Vec<LocalProvider>,
    network: Arc<LocalNetwork>,
) -> (SwapService, mpsc::UnboundedReceiver<BatchNotification>) {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(Arc::new(provider));
    }
    let tokens = Arc::new(TokenRegistryCache::new(
        "http://127.0.0.1:9/registry.json".to_string(),
        3_600,
        reqwest::Client::new(),
    ));
    SwapService::new(
        &test_config(),
        Address::new([9u8; 32]),
        registry,
        network.clone(),
        network.clone(),
        network,
        tokens,
    )
}

#[tokio::test]
async fn test_two_slow_providers_one_quote_survives() {
    let network = Arc::new(LocalNetwork::new(u64::MAX));
    let (service, _batch) = service_with(
        vec![
            LocalProvider::new(ProviderId::Aftermath)
                .quoting(quote(ProviderId::Aftermath, 1_000_000_000, 9_999_999))
                .slow(Duration::from_secs(3)),
            LocalProvider::new(ProviderId::Cetus)
                .quoting(quote(ProviderId::Cetus, 1_000_000_000, 9_999_999))
                .slow(Duration::from_secs(3)),
            LocalProvider::new(ProviderId::FlowX)
                .quoting(quote(ProviderId::FlowX, 1_000_000_000, 2_050_000)),
        ],
        network,
    );

    let quotes = service
        .get_quotes(&TOKEN_IN.into(), &TOKEN_OUT.into(), 1_000_000_000)
        .await
        .unwrap();

    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].provider, ProviderId::FlowX);
    assert_eq!(quotes[0].amount_out, 2_050_000);
}

#[tokio::test]
async fn test_swap_round_trip_with_fallback() {
    let network = Arc::new(LocalNetwork::new(u64::MAX));
    let (service, _batch) = service_with(
        vec![
            LocalProvider::new(ProviderId::Aftermath)
                .quoting(quote(ProviderId::Aftermath, 1_000_000, 2_000_000))
                .rejecting_builds("simulation reverted"),
            LocalProvider::new(ProviderId::Cetus)
                .quoting(quote(ProviderId::Cetus, 1_000_000, 1_990_000)),
        ],
        Arc::clone(&network),
    );
    let signer = LocalSigner::new();

    let result = service
        .swap(
            SwapRequest {
                token_in: TOKEN_IN.into(),
                token_out: TOKEN_OUT.into(),
                amount_in: 1_000_000,
                slippage_bps: Some(50),
                preferred_provider: ProviderId::Aftermath,
                quote: None,
            },
            &signer,
        )
        .await
        .unwrap();

    assert!(result.success);
    assert!(result.digest.is_some());
    assert_eq!(signer.signature_count(), 1);
    assert_eq!(network.submission_count(), 1);
}

#[tokio::test]
async fn test_signer_receives_exact_digest_of_submitted_bytes() {
    let network = Arc::new(LocalNetwork::new(u64::MAX));
    let (service, _batch) = service_with(
        vec![LocalProvider::new(ProviderId::Cetus)
            .quoting(quote(ProviderId::Cetus, 1_000_000, 1_990_000))],
        Arc::clone(&network),
    );
    let signer = LocalSigner::new();

    service
        .swap(
            SwapRequest {
                token_in: TOKEN_IN.into(),
                token_out: TOKEN_OUT.into(),
                amount_in: 1_000_000,
                slippage_bps: None,
                preferred_provider: ProviderId::Cetus,
                quote: None,
            },
            &signer,
        )
        .await
        .unwrap();

    // What the signer saw must be the digest of what hit the network
    let (submitted, _) = network.submissions.lock().unwrap()[0].clone();
    let signed_digest = signer.signed.lock().unwrap()[0];
    let expected = LocalNetwork::expected_signature(&submitted);
    assert_eq!(&expected[..32], &signed_digest);
}

#[tokio::test]
async fn test_mismatched_signature_never_yields_false_success() {
    let network = Arc::new(LocalNetwork::new(u64::MAX));
    let (service, _batch) = service_with(
        vec![LocalProvider::new(ProviderId::Cetus)
            .quoting(quote(ProviderId::Cetus, 1_000_000, 1_990_000))],
        Arc::clone(&network),
    );

    let result = service
        .swap(
            SwapRequest {
                token_in: TOKEN_IN.into(),
                token_out: TOKEN_OUT.into(),
                amount_in: 1_000_000,
                slippage_bps: None,
                preferred_provider: ProviderId::Cetus,
                quote: None,
            },
            &CorruptSigner,
        )
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("signature verification failed")
    );
}

#[tokio::test]
async fn test_insufficient_balance_stops_before_signing() {
    let network = Arc::new(LocalNetwork::new(500));
    let (service, _batch) = service_with(
        vec![LocalProvider::new(ProviderId::Aftermath)
            .quoting(quote(ProviderId::Aftermath, 1_000, 900))],
        Arc::clone(&network),
    );

    let err = service
        .build_swap(SwapRequest {
            token_in: TOKEN_IN.into(),
            token_out: TOKEN_OUT.into(),
            amount_in: 1_000,
            slippage_bps: None,
            preferred_provider: ProviderId::Aftermath,
            quote: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SwapError::InsufficientBalance {
            required: 1_000,
            available: 500
        }
    ));
    assert_eq!(network.submission_count(), 0);
}

#[tokio::test]
async fn test_prepare_for_signing_is_idempotent() {
    let network = Arc::new(LocalNetwork::new(u64::MAX));
    let (service, _batch) = service_with(
        vec![LocalProvider::new(ProviderId::FlowX)
            .quoting(quote(ProviderId::FlowX, 1_000_000, 900_000))],
        network,
    );

    let built = service
        .build_swap(SwapRequest {
            token_in: TOKEN_IN.into(),
            token_out: TOKEN_OUT.into(),
            amount_in: 1_000_000,
            slippage_bps: None,
            preferred_provider: ProviderId::FlowX,
            quote: None,
        })
        .await
        .unwrap();

    let first = service
        .prepare_for_signing(built.transaction.clone())
        .await
        .unwrap();
    let second = service.prepare_for_signing(built.transaction).await.unwrap();

    assert_eq!(first.tx_bytes, second.tx_bytes);
    assert_eq!(first.intent_message, second.intent_message);
    assert_eq!(first.digest, second.digest);
}

#[tokio::test]
async fn test_batched_operations_share_one_submission() {
    let network = Arc::new(LocalNetwork::new(u64::MAX));
    let (service, mut notifications) = service_with(Vec::new(), Arc::clone(&network));
    let signer = LocalSigner::new();

    let batcher = service.batcher();
    batcher.add(OperationKind::Supply, swap_kind(ProviderId::Aftermath));
    batcher.add(OperationKind::Borrow, swap_kind(ProviderId::Cetus));

    // Debounce window (100ms in the test config) elapses without further
    // operations; the batcher signals readiness but does not execute
    let notification = tokio::time::timeout(Duration::from_secs(1), notifications.recv())
        .await
        .unwrap()
        .unwrap();
    match notification {
        BatchNotification::ReadyToExecute { operations } => assert_eq!(operations, 2),
    }
    assert_eq!(network.submission_count(), 0);

    let digests = batcher.execute(&signer).await.unwrap();
    assert_eq!(digests.len(), 1);
    assert_eq!(signer.signature_count(), 1);
    assert_eq!(network.submission_count(), 1);
}
