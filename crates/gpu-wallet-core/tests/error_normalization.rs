use gpu_wallet_core::{
    normalize, ProviderFailure, WalletErrorCode, RPC_REQUEST_PENDING, RPC_USER_REJECTED,
};

fn rpc(code: i64, message: &str) -> ProviderFailure {
    ProviderFailure::Rpc {
        code,
        message: message.to_owned(),
    }
}

#[test]
fn provider_codes_map_to_canonical_codes() {
    assert_eq!(
        normalize(rpc(
            RPC_REQUEST_PENDING,
            "Request of type 'wallet_requestPermissions' already pending"
        ))
        .code(),
        WalletErrorCode::WalletRequestPending
    );
    assert_eq!(
        normalize(rpc(RPC_USER_REJECTED, "whatever")).code(),
        WalletErrorCode::WalletRejected
    );
}

#[test]
fn message_patterns_are_case_insensitive() {
    assert_eq!(
        normalize(rpc(-32603, "User Denied account authorization")).code(),
        WalletErrorCode::WalletRejected
    );
    assert_eq!(
        normalize(ProviderFailure::Transport("Provider Not Found".to_owned())).code(),
        WalletErrorCode::WalletUnavailable
    );
    assert_eq!(
        normalize(ProviderFailure::Transport("Multiple wallets are installed".to_owned())).code(),
        WalletErrorCode::WalletConflict
    );
}

#[test]
fn unmatched_failures_become_unknown_with_detail() {
    let err = normalize(rpc(-32603, "Internal JSON-RPC error."));
    assert_eq!(err.code(), WalletErrorCode::WalletUnknown);
    assert_eq!(err.message(), "Internal JSON-RPC error.");
    assert_ne!(err.code().user_message(), err.message());
}

#[test]
fn codes_serialize_snake_case() {
    let json = serde_json::to_string(&WalletErrorCode::WalletRequestTimeout).expect("serialize");
    assert_eq!(json, "\"wallet_request_timeout\"");
}
