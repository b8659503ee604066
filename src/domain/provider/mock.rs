//! In-memory provider used by unit tests

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::chain::{Address, MoveCall, ProgrammableBlock, TokenId, TransactionKind};
use crate::domain::provider::{BuildRequest, ProviderBuild, SwapProvider};
use crate::shared::errors::SwapError;
use crate::shared::types::{ProviderId, Quote, Route, RouteHop};

/// A valid single-hop quote for the canonical test pair
pub fn test_quote(provider: ProviderId, amount_out: u64) -> Quote {
    let token_in: TokenId = "0x2::a::A".into();
    let token_out: TokenId = "0x2::b::B".into();
    Quote {
        provider,
        token_in: token_in.clone(),
        token_out: token_out.clone(),
        amount_in: 1_000_000_000,
        amount_out,
        routes: vec![Route {
            percent: 100,
            hops: vec![RouteHop {
                provider,
                venue: format!("{}-pool", provider),
                token_in,
                token_out,
                amount_in: 1_000_000_000,
                amount_out,
            }],
        }],
        price_impact_bps: 12,
        raw: serde_json::Value::Null,
    }
}

/// A programmable payload with a single placeholder call
pub fn test_kind(provider: ProviderId) -> TransactionKind {
    TransactionKind::Programmable(ProgrammableBlock::new(vec![MoveCall {
        package: Address::ZERO,
        module: "router".to_string(),
        function: format!("swap_{}", provider),
        type_args: vec![],
        args: vec![],
    }]))
}

/// Scriptable provider: canned quotes, optional delays and failures, and a
/// shared call log for attempt-order assertions.
pub struct MockProvider {
    id: ProviderId,
    quotes: Vec<Quote>,
    quote_delay: Option<Duration>,
    quote_failure: Option<String>,
    build_failure: Option<String>,
    build_delay: Option<Duration>,
    pub build_calls: Arc<AtomicU32>,
    call_log: Option<Arc<Mutex<Vec<ProviderId>>>>,
}

impl MockProvider {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            quotes: Vec::new(),
            quote_delay: None,
            quote_failure: None,
            build_failure: None,
            build_delay: None,
            build_calls: Arc::new(AtomicU32::new(0)),
            call_log: None,
        }
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quotes.push(quote);
        self
    }

    pub fn with_quote_delay(mut self, delay: Duration) -> Self {
        self.quote_delay = Some(delay);
        self
    }

    pub fn failing_quotes(mut self, reason: &str) -> Self {
        self.quote_failure = Some(reason.to_string());
        self
    }

    pub fn failing_build(mut self, reason: &str) -> Self {
        self.build_failure = Some(reason.to_string());
        self
    }

    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = Some(delay);
        self
    }

    pub fn with_call_log(mut self, log: Arc<Mutex<Vec<ProviderId>>>) -> Self {
        self.call_log = Some(log);
        self
    }
}

#[async_trait]
impl SwapProvider for MockProvider {
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
        if let Some(reason) = &self.quote_failure {
            return Err(SwapError::ProviderUnavailable {
                provider: self.id.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.quotes.clone())
    }

    async fn build_transaction(&self, request: &BuildRequest) -> Result<ProviderBuild, SwapError> {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(log) = &self.call_log {
            log.lock().unwrap().push(self.id);
        }
        if let Some(delay) = self.build_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.build_failure {
            return Err(SwapError::BuildRejected {
                provider: self.id.to_string(),
                reason: reason.clone(),
            });
        }

        let mut realized = self
            .quotes
            .first()
            .cloned()
            .unwrap_or_else(|| test_quote(self.id, request.amount_in));
        realized.amount_in = request.amount_in;

        Ok(ProviderBuild {
            kind: test_kind(self.id),
            realized,
        })
    }
}
