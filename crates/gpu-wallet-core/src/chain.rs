use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::{RpcMethod, WalletProvider};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: Option<String>,
    pub chain_name: Option<String>,
    pub allowed: bool,
}

impl ChainInfo {
    /// Result of an unreadable chain: identity unknown, never blocking.
    pub fn unknown() -> Self {
        Self {
            chain_id: None,
            chain_name: None,
            allowed: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainAllowList {
    ids: Vec<String>,
}

impl ChainAllowList {
    /// Parses a comma-separated list; blank entries are skipped.
    pub fn parse(raw: &str) -> Self {
        let ids = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(normalize_chain_id)
            .collect();
        Self { ids }
    }

    pub fn from_ids<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(|id| normalize_chain_id(id.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn allows(&self, normalized_id: &str) -> bool {
        self.ids.is_empty() || self.ids.iter().any(|id| id == normalized_id)
    }
}

/// Canonical lowercase `0x` hex form; unparseable ids are lowercased as-is.
pub fn normalize_chain_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => trimmed.parse::<u64>().ok(),
    };
    match parsed {
        Some(id) => format!("{id:#x}"),
        None => trimmed.to_lowercase(),
    }
}

fn chain_id_from_value(value: &Value) -> Option<String> {
    if let Some(n) = value.as_u64() {
        return Some(format!("{n:#x}"));
    }
    value.as_str().map(normalize_chain_id)
}

pub fn chain_name(normalized_id: &str) -> String {
    let name = match normalized_id {
        "0x1" => "Ethereum",
        "0xa" => "Optimism",
        "0x38" => "BNB Chain",
        "0x89" => "Polygon",
        "0x144" => "zkSync Era",
        "0x2105" => "Base",
        "0x4268" => "Holesky",
        "0xa4b1" => "Arbitrum One",
        "0xa86a" => "Avalanche",
        "0xe708" => "Linea",
        "0x13882" => "Polygon Amoy",
        "0x14a34" => "Base Sepolia",
        "0x66eee" => "Arbitrum Sepolia",
        "0x82750" => "Scroll",
        "0xaa36a7" => "Sepolia",
        other => other,
    };
    name.to_owned()
}

/// Reads `eth_chainId` and checks it against the allow-list.
pub async fn read_chain<P: WalletProvider>(provider: &P, allow_list: &ChainAllowList) -> ChainInfo {
    let raw = match provider.request(RpcMethod::ChainId).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "chain id read failed; treating chain as allowed");
            return ChainInfo::unknown();
        }
    };
    let Some(chain_id) = chain_id_from_value(&raw) else {
        tracing::debug!(%raw, "chain id has unexpected shape");
        return ChainInfo::unknown();
    };
    ChainInfo {
        chain_name: Some(chain_name(&chain_id)),
        allowed: allow_list.allows(&chain_id),
        chain_id: Some(chain_id),
    }
}
