use crate::domain::WalletStatus;
use crate::error::WalletErrorCode;

/// Status when nothing is in progress, from wallet presence alone.
pub fn resting_status(has_connected: bool, has_env: bool) -> WalletStatus {
    if has_connected {
        WalletStatus::Connected
    } else if has_env {
        WalletStatus::Fallback
    } else {
        WalletStatus::Idle
    }
}

/// Status after a failed connect or discovery.
pub fn failure_status(code: WalletErrorCode, has_connected: bool, has_env: bool) -> WalletStatus {
    if has_connected {
        return WalletStatus::Connected;
    }
    match code {
        WalletErrorCode::WalletRequestPending | WalletErrorCode::WalletRequestTimeout => {
            WalletStatus::Attention
        }
        WalletErrorCode::WalletRejected => resting_status(false, has_env),
        _ if has_env => WalletStatus::Fallback,
        _ => WalletStatus::Error,
    }
}

/// Whether the one-second nudge may overwrite `current`.
pub fn accepts_prompt(current: WalletStatus) -> bool {
    !matches!(current, WalletStatus::Attention | WalletStatus::Connected)
}
