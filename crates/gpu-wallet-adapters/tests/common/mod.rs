#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use alloy::primitives::Address;

use gpu_wallet_adapters::{RuntimeTimer, ScriptedProvider, ScriptedWallets, WalletAdapterConfig};
use gpu_wallet_core::{ChainAllowList, Subscription, WalletController, WalletStatus};

pub type TestController = WalletController<ScriptedWallets, RuntimeTimer>;

pub fn user_address() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("valid user address")
}

pub fn env_address() -> Address {
    "0x000000000000000000000000000000000000BEEF"
        .parse()
        .expect("valid fallback address")
}

pub fn controller_with(
    wallets: ScriptedWallets,
    env_wallet: Option<Address>,
    allowed_chains: &str,
) -> TestController {
    let config = WalletAdapterConfig {
        fallback_wallet: env_wallet,
        allowed_chains: ChainAllowList::parse(allowed_chains),
        ..WalletAdapterConfig::default()
    };
    WalletController::new(wallets, RuntimeTimer, config.controller_config())
}

/// One MetaMask-flagged provider holding [`user_address`].
pub fn single_wallet(env_wallet: Option<Address>) -> (ScriptedProvider, TestController) {
    let provider = ScriptedProvider::metamask(vec![user_address()]);
    let controller = controller_with(
        ScriptedWallets::new(vec![provider.clone()]),
        env_wallet,
        "",
    );
    (provider, controller)
}

pub fn record_statuses(
    controller: &TestController,
) -> (Rc<RefCell<Vec<WalletStatus>>>, Subscription) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let sub = controller.subscribe(move |s| sink.borrow_mut().push(s.status));
    (seen, sub)
}

pub async fn wait_for_prompt(provider: &ScriptedProvider) {
    while provider.deferred_count() == 0 {
        tokio::task::yield_now().await;
    }
}
