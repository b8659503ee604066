//! Provider registry: identifier-to-implementation mapping

use std::sync::Arc;

use crate::domain::provider::SwapProvider;
use crate::shared::types::ProviderId;

/// Ordered collection of registered providers. Registration order is the
/// deterministic tie-break order for equal quotes and the default fallback
/// order for builds.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn SwapProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a provider. Re-registering an id replaces the earlier entry
    /// while keeping its position.
    pub fn register(&mut self, provider: Arc<dyn SwapProvider>) {
        if let Some(slot) = self
            .providers
            .iter_mut()
            .find(|existing| existing.id() == provider.id())
        {
            *slot = provider;
        } else {
            self.providers.push(provider);
        }
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn SwapProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.id() == id)
            .cloned()
    }

    /// Providers in registration order
    pub fn all(&self) -> &[Arc<dyn SwapProvider>] {
        &self.providers
    }

    /// Registered identifiers in registration order
    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|provider| provider.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
