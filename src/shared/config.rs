//! Application configuration loaded from Config.toml

use serde::{Deserialize, Serialize};
use std::fs;

use crate::shared::errors::AppError;

/// Network (fullnode) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub request_timeout_ms: u64,
    /// Gas budget applied to a single built transaction
    pub gas_budget: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://fullnode.mainnet.tideway.dev".to_string(),
            request_timeout_ms: 10_000,
            gas_budget: 50_000_000,
        }
    }
}

/// Per-provider endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    pub aftermath_url: String,
    pub cetus_url: String,
    pub flowx_url: String,
    /// Provider registration order; also the quote tie-break order
    pub order: Vec<String>,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            aftermath_url: "https://aftermath.finance/api".to_string(),
            cetus_url: "https://api-sui.cetus.zone".to_string(),
            flowx_url: "https://api.flowx.finance".to_string(),
            order: vec![
                "aftermath".to_string(),
                "cetus".to_string(),
                "flowx".to_string(),
            ],
        }
    }
}

/// Swap pipeline timing knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Aggregate quote fan-out window; slow providers are excluded, not failed
    pub quote_timeout_ms: u64,
    /// Wall-clock bound on a single provider build or serialization step
    pub build_timeout_secs: u64,
    pub default_slippage_bps: u32,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            quote_timeout_ms: 1_500,
            build_timeout_secs: 30,
            default_slippage_bps: 100,
        }
    }
}

/// Execution and confirmation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub confirm_timeout_secs: u64,
    /// Reconciliation re-queries by digest after a confirmation timeout
    pub reconcile_attempts: u32,
    pub reconcile_interval_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: 60,
            reconcile_attempts: 5,
            reconcile_interval_ms: 2_000,
        }
    }
}

/// Batcher debounce configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub debounce_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 2_000 }
    }
}

/// Token registry cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub token_registry_url: String,
    pub cache_ttl_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            token_registry_url: "https://tokens.tideway.dev/registry.json".to_string(),
            cache_ttl_secs: 3_600,
        }
    }
}

/// Wallet core configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WalletConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub providers: ProviderEndpoints,
    #[serde(default)]
    pub swap: SwapConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl WalletConfig {
    /// Load configuration from a toml file
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: WalletConfig = toml::from_str(&content)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }
}
