mod common;

use gpu_wallet_adapters::{Approval, ScriptedProvider, ScriptedWallets};
use gpu_wallet_core::{
    ProviderDescriptor, ProviderFailure, WalletErrorCode, WalletSource, WalletStatus,
    RPC_REQUEST_PENDING,
};

use common::{controller_with, env_address, single_wallet, user_address};

#[tokio::test]
async fn missing_provider_falls_back_to_env_wallet() {
    let controller = controller_with(ScriptedWallets::default(), Some(env_address()), "");

    let err = controller.connect().await.expect_err("no provider");
    assert_eq!(err.code(), WalletErrorCode::WalletUnavailable);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, WalletStatus::Fallback);
    assert_eq!(snapshot.active_wallet(), Some(env_address()));
    assert_eq!(snapshot.source(), WalletSource::Env);
    assert!(!snapshot.has_provider);
    assert_eq!(
        snapshot.message.as_deref(),
        Some(WalletErrorCode::WalletUnavailable.user_message())
    );
}

#[tokio::test]
async fn missing_provider_without_fallback_is_an_error() {
    let controller = controller_with(ScriptedWallets::default(), None, "");
    let err = controller.connect().await.expect_err("no provider");
    assert_eq!(err.code(), WalletErrorCode::WalletUnavailable);
    assert_eq!(controller.snapshot().status, WalletStatus::Error);
    assert_eq!(controller.active_wallet(), None);
}

#[tokio::test]
async fn rejection_returns_to_resting_state() {
    let (provider, controller) = single_wallet(Some(env_address()));
    provider.set_approval(Approval::Reject);

    let err = controller.connect().await.expect_err("rejected");
    assert_eq!(err.code(), WalletErrorCode::WalletRejected);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, WalletStatus::Fallback);
    assert!(!snapshot.connecting);

    let (provider, controller) = single_wallet(None);
    provider.set_approval(Approval::Reject);
    assert!(controller.connect().await.is_err());
    assert_eq!(controller.snapshot().status, WalletStatus::Idle);
}

#[tokio::test]
async fn provider_side_pending_request_needs_attention() {
    let (provider, controller) = single_wallet(Some(env_address()));
    provider.set_approval(Approval::Fail(ProviderFailure::Rpc {
        code: RPC_REQUEST_PENDING,
        message: "Already processing eth_requestAccounts. Please wait.".to_owned(),
    }));

    let err = controller.connect().await.expect_err("pending");
    assert_eq!(err.code(), WalletErrorCode::WalletRequestPending);
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.status, WalletStatus::Attention);
    assert_eq!(
        snapshot.message.as_deref(),
        Some(WalletErrorCode::WalletRequestPending.user_message())
    );
}

#[tokio::test]
async fn empty_account_list_is_unknown_failure() {
    let provider = ScriptedProvider::metamask(Vec::new());
    let controller = controller_with(ScriptedWallets::new(vec![provider]), None, "");

    let err = controller.connect().await.expect_err("no accounts");
    assert_eq!(err.code(), WalletErrorCode::WalletUnknown);
    assert_eq!(err.message(), "no account returned");
    assert_eq!(controller.snapshot().status, WalletStatus::Error);
}

#[tokio::test]
async fn ambiguous_providers_refuse_to_connect() {
    let coinbase = ProviderDescriptor {
        is_coinbase_wallet: true,
        ..ProviderDescriptor::default()
    };
    let wallets = ScriptedWallets::new(vec![
        ScriptedProvider::new(coinbase, vec![user_address()]),
        ScriptedProvider::new(ProviderDescriptor::default(), vec![user_address()]),
    ]);
    let controller = controller_with(wallets, Some(env_address()), "");

    let err = controller.connect().await.expect_err("conflict");
    assert_eq!(err.code(), WalletErrorCode::WalletConflict);
    let snapshot = controller.snapshot();
    assert!(snapshot.has_conflict);
    assert_eq!(snapshot.status, WalletStatus::Fallback);
}

#[tokio::test]
async fn canonical_provider_connects_despite_conflict() {
    let canonical = ScriptedProvider::metamask(vec![user_address()]);
    let wallets = ScriptedWallets::new(vec![
        ScriptedProvider::new(ProviderDescriptor::default(), Vec::new()),
        canonical,
    ]);
    let controller = controller_with(wallets, None, "");

    assert_eq!(controller.connect().await, Ok(user_address()));
    let snapshot = controller.snapshot();
    assert!(snapshot.has_conflict);
    assert_eq!(snapshot.provider_name.as_deref(), Some("MetaMask"));
    assert!(snapshot.error.is_none());
}

#[tokio::test]
async fn dismissing_an_error_keeps_the_wallet_state() {
    let (provider, controller) = single_wallet(None);
    provider.set_approval(Approval::Reject);
    assert!(controller.connect().await.is_err());
    assert!(controller.snapshot().error.is_some());

    controller.dismiss_error();
    let snapshot = controller.snapshot();
    assert!(snapshot.error.is_none());
    assert!(snapshot.message.is_none());
    assert_eq!(snapshot.status, WalletStatus::Idle);
}
