use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;

use gpu_wallet_core::{parse_configured_address, ChainAllowList, ControllerConfig};

pub const FALLBACK_ADDRESS_KEY: &str = "GPU_WALLET_FALLBACK_ADDRESS";
pub const ALLOWED_CHAINS_KEY: &str = "GPU_WALLET_ALLOWED_CHAINS";
pub const PROMPT_AFTER_KEY: &str = "GPU_WALLET_PROMPT_AFTER_MS";
pub const ATTENTION_AFTER_KEY: &str = "GPU_WALLET_ATTENTION_AFTER_MS";
pub const PROXY_URL_KEY: &str = "GPU_WALLET_EIP1193_PROXY_URL";
pub const PROXY_TIMEOUT_KEY: &str = "GPU_WALLET_PROXY_TIMEOUT_MS";
pub const PROXY_NAME_KEY: &str = "GPU_WALLET_PROXY_NAME";
pub const CHAIN_TIMEOUT_KEY: &str = "GPU_WALLET_CHAIN_TIMEOUT_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a whole number of milliseconds, got {value:?}")]
    InvalidMillis { key: &'static str, value: String },
    #[error(
        "attention deadline ({attention_ms} ms) must be later than prompt deadline ({prompt_ms} ms)"
    )]
    StageOrder { prompt_ms: u64, attention_ms: u64 },
    #[error("failed to build EIP-1193 proxy client: {0}")]
    ProxyClient(String),
}

#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    pub fallback_wallet: Option<Address>,
    pub allowed_chains: ChainAllowList,
    pub prompt_after_ms: u64,
    pub attention_after_ms: u64,
    pub chain_timeout_ms: u64,
    pub eip1193_proxy_url: Option<String>,
    pub proxy_timeout_ms: u64,
    pub proxy_name: Option<String>,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            fallback_wallet: None,
            allowed_chains: ChainAllowList::default(),
            prompt_after_ms: 1_000,
            attention_after_ms: 15_000,
            chain_timeout_ms: 5_000,
            eip1193_proxy_url: None,
            proxy_timeout_ms: 15_000,
            proxy_name: None,
        }
    }
}

impl WalletAdapterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Values baked in at compile time, for wasm builds without a process env.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| {
            let value = match key {
                FALLBACK_ADDRESS_KEY => option_env!("GPU_WALLET_FALLBACK_ADDRESS"),
                ALLOWED_CHAINS_KEY => option_env!("GPU_WALLET_ALLOWED_CHAINS"),
                PROMPT_AFTER_KEY => option_env!("GPU_WALLET_PROMPT_AFTER_MS"),
                ATTENTION_AFTER_KEY => option_env!("GPU_WALLET_ATTENTION_AFTER_MS"),
                CHAIN_TIMEOUT_KEY => option_env!("GPU_WALLET_CHAIN_TIMEOUT_MS"),
                _ => None,
            };
            value.map(str::to_owned)
        })
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fallback_wallet = match non_empty(FALLBACK_ADDRESS_KEY) {
            Some(raw) => match parse_configured_address(&raw) {
                Ok(address) => address,
                Err(e) => {
                    tracing::warn!(
                        value = %raw,
                        error = %e,
                        "ignoring unparseable fallback wallet"
                    );
                    None
                }
            },
            None => None,
        };

        let allowed_chains = non_empty(ALLOWED_CHAINS_KEY)
            .map(|raw| ChainAllowList::parse(&raw))
            .unwrap_or_default();

        let prompt_after_ms = parse_millis(PROMPT_AFTER_KEY, non_empty(PROMPT_AFTER_KEY))?
            .unwrap_or(defaults.prompt_after_ms);
        let attention_after_ms = parse_millis(ATTENTION_AFTER_KEY, non_empty(ATTENTION_AFTER_KEY))?
            .unwrap_or(defaults.attention_after_ms);
        if attention_after_ms <= prompt_after_ms {
            return Err(ConfigError::StageOrder {
                prompt_ms: prompt_after_ms,
                attention_ms: attention_after_ms,
            });
        }

        let chain_timeout_ms = parse_millis(CHAIN_TIMEOUT_KEY, non_empty(CHAIN_TIMEOUT_KEY))?
            .unwrap_or(defaults.chain_timeout_ms);
        let proxy_timeout_ms = parse_millis(PROXY_TIMEOUT_KEY, non_empty(PROXY_TIMEOUT_KEY))?
            .unwrap_or(defaults.proxy_timeout_ms);

        Ok(Self {
            fallback_wallet,
            allowed_chains,
            prompt_after_ms,
            attention_after_ms,
            chain_timeout_ms,
            eip1193_proxy_url: non_empty(PROXY_URL_KEY).map(|s| s.trim().to_owned()),
            proxy_timeout_ms,
            proxy_name: non_empty(PROXY_NAME_KEY),
        })
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            env_wallet: self.fallback_wallet,
            allowed_chains: self.allowed_chains.clone(),
            prompt_after: Duration::from_millis(self.prompt_after_ms),
            attention_after: Duration::from_millis(self.attention_after_ms),
            chain_timeout: Duration::from_millis(self.chain_timeout_ms),
        }
    }
}

fn parse_millis(key: &'static str, raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    raw.map(|value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidMillis { key, value })
    })
    .transpose()
}
