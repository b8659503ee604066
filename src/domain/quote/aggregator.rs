//! Concurrent quote fan-out with timeout exclusion and stable ordering

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::chain::TokenId;
use crate::domain::provider::ProviderRegistry;
use crate::shared::errors::SwapError;
use crate::shared::types::Quote;

/// Fans a quote request out to every registered provider, excludes the slow
/// and the failing, and returns the union sorted best-price-first.
pub struct QuoteAggregator {
    registry: Arc<ProviderRegistry>,
    timeout: Duration,
    /// Monotonic request generation; quote cycles carrying a stale
    /// generation are discarded (last-request-wins).
    generation: AtomicU64,
}

impl QuoteAggregator {
    pub fn new(registry: Arc<ProviderRegistry>, timeout: Duration) -> Self {
        Self {
            registry,
            timeout,
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch quotes from all providers for a pair and input amount.
    ///
    /// Providers that miss the aggregate window or fail are excluded from
    /// the result, not propagated. An empty union is `NoRoutesFound`. If a
    /// newer request started while this one was in flight, the stale cycle
    /// is abandoned with `SupersededRequest`.
    pub async fn get_quotes(
        &self,
        token_in: &TokenId,
        token_out: &TokenId,
        amount_in: u64,
    ) -> Result<Vec<Quote>, SwapError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "quote cycle {}: {} -> {} amount {}",
            generation, token_in, token_out, amount_in
        );

        let fetches = self.registry.all().iter().map(|provider| {
            let provider = Arc::clone(provider);
            let token_in = token_in.clone();
            let token_out = token_out.clone();
            let window = self.timeout;
            async move {
                let id = provider.id();
                match tokio::time::timeout(
                    window,
                    provider.get_quotes(&token_in, &token_out, amount_in),
                )
                .await
                {
                    Ok(Ok(quotes)) => quotes,
                    Ok(Err(err)) => {
                        warn!("provider {} excluded from cycle: {}", id, err);
                        Vec::new()
                    }
                    Err(_) => {
                        warn!(
                            "provider {} missed the {}ms quote window, excluded",
                            id,
                            window.as_millis()
                        );
                        Vec::new()
                    }
                }
            }
        });

        // join_all keeps registration order, which the stable sort below
        // preserves for equal outputs
        let results = join_all(fetches).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("quote cycle {} superseded, discarding results", generation);
            return Err(SwapError::SupersededRequest);
        }

        let mut quotes: Vec<Quote> = results
            .into_iter()
            .flatten()
            .filter(|quote| match quote.validate() {
                Ok(()) => true,
                Err(reason) => {
                    warn!(
                        "dropping malformed quote from {}: {}",
                        quote.provider, reason
                    );
                    false
                }
            })
            .collect();

        quotes.sort_by(|a, b| b.amount_out.cmp(&a.amount_out));

        if quotes.is_empty() {
            return Err(SwapError::NoRoutesFound);
        }

        debug!(
            "quote cycle {}: {} quotes, best {} from {}",
            generation,
            quotes.len(),
            quotes[0].amount_out,
            quotes[0].provider
        );
        Ok(quotes)
    }
}
