use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Idle,
    Checking,
    Prompting,
    Attention,
    Connected,
    Fallback,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletSource {
    Connected,
    Env,
    None,
}

/// Reactive view of wallet connectivity. Only the controller writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSnapshot {
    pub connected_wallet: Option<Address>,
    pub env_wallet: Option<Address>,
    pub status: WalletStatus,
    pub error: Option<WalletError>,
    pub message: Option<String>,
    pub provider_name: Option<String>,
    pub has_provider: bool,
    pub has_conflict: bool,
    pub chain_id: Option<String>,
    pub chain_name: Option<String>,
    pub chain_allowed: bool,
    pub connecting: bool,
    pub revision: u64,
}

impl WalletSnapshot {
    pub fn new(env_wallet: Option<Address>) -> Self {
        Self {
            connected_wallet: None,
            env_wallet,
            status: if env_wallet.is_some() {
                WalletStatus::Fallback
            } else {
                WalletStatus::Idle
            },
            error: None,
            message: None,
            provider_name: None,
            has_provider: false,
            has_conflict: false,
            chain_id: None,
            chain_name: None,
            chain_allowed: true,
            connecting: false,
            revision: 0,
        }
    }

    pub fn active_wallet(&self) -> Option<Address> {
        self.connected_wallet.or(self.env_wallet)
    }

    pub fn source(&self) -> WalletSource {
        if self.connected_wallet.is_some() {
            WalletSource::Connected
        } else if self.env_wallet.is_some() {
            WalletSource::Env
        } else {
            WalletSource::None
        }
    }

    pub(crate) fn set_error(&mut self, error: WalletError) {
        self.message = Some(error.code().user_message().to_owned());
        self.error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
        self.message = None;
    }
}

/// Parses an operator-configured address. Empty or all-zero means "not configured".
pub fn parse_configured_address(raw: &str) -> Result<Option<Address>, alloy::hex::FromHexError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let address: Address = trimmed.parse()?;
    Ok((!address.is_zero()).then_some(address))
}
