use std::future::Future;
use std::time::Duration;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderFailure;
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    /// Silent read of already-authorized accounts.
    #[serde(rename = "eth_accounts")]
    Accounts,
    /// Prompting request; opens the wallet's approval UI.
    #[serde(rename = "eth_requestAccounts")]
    RequestAccounts,
    #[serde(rename = "eth_chainId")]
    ChainId,
}

impl RpcMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "eth_accounts",
            Self::RequestAccounts => "eth_requestAccounts",
            Self::ChainId => "eth_chainId",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderEventKind {
    #[serde(rename = "accountsChanged")]
    AccountsChanged,
    #[serde(rename = "chainChanged")]
    ChainChanged,
    #[serde(rename = "connect")]
    Connect,
    #[serde(rename = "disconnect")]
    Disconnect,
}

impl ProviderEventKind {
    pub const ALL: [ProviderEventKind; 4] = [
        Self::AccountsChanged,
        Self::ChainChanged,
        Self::Connect,
        Self::Disconnect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEvent {
    pub kind: ProviderEventKind,
    pub payload: Value,
}

pub type EventListener = Box<dyn Fn(ProviderEvent)>;

/// Self-identification flags an injected provider exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub is_metamask: bool,
    pub is_coinbase_wallet: bool,
    pub is_brave_wallet: bool,
    pub is_rabby: bool,
    /// Explicit label, e.g. from EIP-6963 info or operator config.
    pub label: Option<String>,
}

impl ProviderDescriptor {
    pub fn metamask() -> Self {
        Self {
            is_metamask: true,
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        // Rabby and Brave also set isMetaMask for compatibility.
        let name = if self.is_rabby {
            "Rabby"
        } else if self.is_brave_wallet {
            "Brave Wallet"
        } else if self.is_coinbase_wallet {
            "Coinbase Wallet"
        } else if self.is_metamask {
            "MetaMask"
        } else {
            "Injected wallet"
        };
        name.to_owned()
    }
}

/// One injected EIP-1193 handle.
pub trait WalletProvider: Clone + 'static {
    fn descriptor(&self) -> ProviderDescriptor;

    fn request(
        &self,
        method: RpcMethod,
    ) -> impl Future<Output = Result<Value, ProviderFailure>> + 'static;

    /// Registers a lifecycle listener. `None` when the handle has no `on`.
    fn subscribe(
        &self,
        _kind: ProviderEventKind,
        _listener: EventListener,
    ) -> Option<Subscription> {
        None
    }
}

/// Ambient set of injected providers, read fresh on every call.
pub trait ProviderSource: 'static {
    type Provider: WalletProvider;

    fn candidates(&self) -> Vec<Self::Provider>;
}

pub trait TimerPort: Clone + 'static {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + 'static;
}

/// Page visibility, used to re-sync after the tab returns to the foreground.
pub trait VisibilitySource {
    fn on_visible(&self, listener: Box<dyn Fn()>) -> Option<Subscription>;
}

pub fn accounts_from_value(value: &Value) -> Result<Vec<Address>, ProviderFailure> {
    let arr = value
        .as_array()
        .ok_or_else(|| ProviderFailure::Validation("accounts result must be array".to_owned()))?;
    let mut accounts = Vec::with_capacity(arr.len());
    for item in arr {
        let raw = item.as_str().ok_or_else(|| {
            ProviderFailure::Validation("account entry must be string".to_owned())
        })?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| ProviderFailure::Validation(format!("invalid account: {e}")))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}

pub async fn read_accounts<P: WalletProvider>(
    provider: &P,
    method: RpcMethod,
) -> Result<Vec<Address>, ProviderFailure> {
    let value = provider.request(method).await?;
    accounts_from_value(&value)
}
