use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RPC code wallets return while an `eth_requestAccounts` prompt is already open.
pub const RPC_REQUEST_PENDING: i64 = -32002;
/// EIP-1193 "user rejected request".
pub const RPC_USER_REJECTED: i64 = 4001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletErrorCode {
    WalletUnavailable,
    WalletRequestPending,
    WalletRequestTimeout,
    WalletRejected,
    WalletConflict,
    WalletUnknown,
}

impl WalletErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WalletUnavailable => "wallet_unavailable",
            Self::WalletRequestPending => "wallet_request_pending",
            Self::WalletRequestTimeout => "wallet_request_timeout",
            Self::WalletRejected => "wallet_rejected",
            Self::WalletConflict => "wallet_conflict",
            Self::WalletUnknown => "wallet_unknown",
        }
    }

    /// Text shown to the user. Raw provider output never reaches the UI.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::WalletUnavailable => {
                "No browser wallet was found. Install or enable a wallet extension to connect."
            }
            Self::WalletRequestPending => {
                "A wallet request is already open. Check your wallet extension to continue."
            }
            Self::WalletRequestTimeout => {
                "Your wallet has not responded yet. Open the wallet extension to approve or reject the request."
            }
            Self::WalletRejected => "The connection request was declined in your wallet.",
            Self::WalletConflict => {
                "Several wallet extensions are competing for this page. Disable all but one to connect."
            }
            Self::WalletUnknown => "The wallet could not be connected. Please try again.",
        }
    }

    /// Errors that describe the provider environment rather than a request.
    pub fn is_discovery(self) -> bool {
        matches!(self, Self::WalletUnavailable | Self::WalletConflict)
    }
}

impl fmt::Display for WalletErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical wallet error. Built once, replaced but never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct WalletError {
    code: WalletErrorCode,
    message: String,
}

impl WalletError {
    pub fn new(code: WalletErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(
            WalletErrorCode::WalletUnavailable,
            "no injected wallet provider",
        )
    }

    pub fn request_pending() -> Self {
        Self::new(
            WalletErrorCode::WalletRequestPending,
            "a wallet connection request is already open",
        )
    }

    pub fn request_timeout() -> Self {
        Self::new(
            WalletErrorCode::WalletRequestTimeout,
            "wallet connection request is still unanswered",
        )
    }

    pub fn conflict() -> Self {
        Self::new(
            WalletErrorCode::WalletConflict,
            "multiple wallet providers detected and none is canonical",
        )
    }

    pub fn code(&self) -> WalletErrorCode {
        self.code
    }

    /// Diagnostic detail. May carry provider text; use [`WalletErrorCode::user_message`] for UI.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Raw failure surfaced by a provider port before normalization.
#[derive(Debug, Clone, Error)]
pub enum ProviderFailure {
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("provider rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
}

impl ProviderFailure {
    fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    fn raw_message(&self) -> String {
        match self {
            Self::Rpc { message, .. } => message.clone(),
            Self::Transport(m) | Self::Validation(m) => m.clone(),
            Self::NotImplemented(what) => (*what).to_owned(),
            Self::Wallet(err) => err.message().to_owned(),
        }
    }
}

const REJECTED_PATTERNS: &[&str] = &["user rejected", "user denied", "rejected the request"];
const UNAVAILABLE_PATTERNS: &[&str] = &["not found", "unavailable", "not installed"];
const CONFLICT_PATTERNS: &[&str] = &["multiple wallet"];

/// Maps any provider failure onto the closed [`WalletErrorCode`] set.
pub fn normalize(failure: ProviderFailure) -> WalletError {
    if let ProviderFailure::Wallet(err) = failure {
        return err;
    }

    let code = failure.rpc_code();
    let message = failure.raw_message();
    let lowered = message.to_lowercase();
    let matches_any = |patterns: &[&str]| patterns.iter().any(|p| lowered.contains(p));

    let canonical = if code == Some(RPC_REQUEST_PENDING) {
        WalletErrorCode::WalletRequestPending
    } else if code == Some(RPC_USER_REJECTED) || matches_any(REJECTED_PATTERNS) {
        WalletErrorCode::WalletRejected
    } else if matches_any(UNAVAILABLE_PATTERNS) {
        WalletErrorCode::WalletUnavailable
    } else if matches_any(CONFLICT_PATTERNS) {
        WalletErrorCode::WalletConflict
    } else {
        WalletErrorCode::WalletUnknown
    };

    WalletError::new(canonical, message)
}

impl From<ProviderFailure> for WalletError {
    fn from(failure: ProviderFailure) -> Self {
        normalize(failure)
    }
}
