use gpu_wallet_core::{
    accepts_prompt, failure_status, resting_status, WalletErrorCode, WalletStatus,
};

#[test]
fn resting_status_follows_wallet_presence() {
    assert_eq!(resting_status(true, true), WalletStatus::Connected);
    assert_eq!(resting_status(false, true), WalletStatus::Fallback);
    assert_eq!(resting_status(false, false), WalletStatus::Idle);
}

#[test]
fn rejection_degrades_quietly() {
    assert_eq!(
        failure_status(WalletErrorCode::WalletRejected, false, true),
        WalletStatus::Fallback
    );
    assert_eq!(
        failure_status(WalletErrorCode::WalletRejected, false, false),
        WalletStatus::Idle
    );
}

#[test]
fn pending_request_needs_attention() {
    assert_eq!(
        failure_status(WalletErrorCode::WalletRequestPending, false, true),
        WalletStatus::Attention
    );
}

#[test]
fn other_failures_fall_back_or_error() {
    assert_eq!(
        failure_status(WalletErrorCode::WalletUnavailable, false, true),
        WalletStatus::Fallback
    );
    assert_eq!(
        failure_status(WalletErrorCode::WalletUnknown, false, false),
        WalletStatus::Error
    );
}

#[test]
fn connected_wallet_always_wins() {
    for code in [
        WalletErrorCode::WalletUnavailable,
        WalletErrorCode::WalletRequestPending,
        WalletErrorCode::WalletConflict,
    ] {
        assert_eq!(failure_status(code, true, false), WalletStatus::Connected);
    }
}

#[test]
fn prompt_never_downgrades_attention() {
    assert!(accepts_prompt(WalletStatus::Checking));
    assert!(!accepts_prompt(WalletStatus::Attention));
    assert!(!accepts_prompt(WalletStatus::Connected));
}
