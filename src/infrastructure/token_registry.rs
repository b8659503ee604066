//! Process-wide token registry cache
//!
//! The registry is fetched from an external token list and kept for one
//! hour. Reads are concurrent; a refresh overwrites the whole entry, so a
//! duplicate concurrent refresh is harmless and the last writer wins.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::TokenId;
use crate::shared::errors::SwapError;

/// Fixed key under which the registry snapshot is cached
pub const TOKEN_REGISTRY_CACHE_KEY: &str = "token-registry-v1";

/// One token list entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub coin_type: TokenId,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(default)]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedRegistry {
    fetched_at: DateTime<Utc>,
    tokens: Vec<TokenDescriptor>,
}

/// Time-bound cache over the external token registry
pub struct TokenRegistryCache {
    http_client: Client,
    url: String,
    ttl: Duration,
    cache: RwLock<Option<CachedRegistry>>,
}

impl TokenRegistryCache {
    pub fn new(url: String, ttl_secs: u64, http_client: Client) -> Self {
        Self {
            http_client,
            url,
            ttl: Duration::seconds(ttl_secs as i64),
            cache: RwLock::new(None),
        }
    }

    /// Current token list, served from cache while fresh
    pub async fn tokens(&self) -> Result<Vec<TokenDescriptor>, SwapError> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(cached) = cache.as_ref() {
                if Utc::now() - cached.fetched_at < self.ttl {
                    debug!(
                        "{}: serving {} tokens from cache",
                        TOKEN_REGISTRY_CACHE_KEY,
                        cached.tokens.len()
                    );
                    return Ok(cached.tokens.clone());
                }
            }
        }
        self.refresh().await
    }

    /// Fetch the registry and replace the cached snapshot
    pub async fn refresh(&self) -> Result<Vec<TokenDescriptor>, SwapError> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SwapError::Rpc(format!("token registry fetch failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(SwapError::Rpc(format!(
                "token registry returned status {}",
                response.status()
            )));
        }

        let tokens: Vec<TokenDescriptor> = response
            .json()
            .await
            .map_err(|e| SwapError::Rpc(format!("undecodable token registry: {}", e)))?;

        info!(
            "{}: refreshed with {} tokens",
            TOKEN_REGISTRY_CACHE_KEY,
            tokens.len()
        );

        let mut cache = self.cache.write().unwrap();
        *cache = Some(CachedRegistry {
            fetched_at: Utc::now(),
            tokens: tokens.clone(),
        });
        Ok(tokens)
    }
}
