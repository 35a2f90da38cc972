use std::collections::HashMap;
use std::time::Duration;

use gpu_wallet_adapters::{ConfigError, InjectedWallets, WalletAdapterConfig};
use gpu_wallet_core::ProviderSource;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn empty_environment_uses_defaults() {
    let config = WalletAdapterConfig::from_lookup(lookup(&[])).expect("defaults");
    assert_eq!(config.fallback_wallet, None);
    assert!(config.allowed_chains.is_empty());
    assert_eq!(config.prompt_after_ms, 1_000);
    assert_eq!(config.attention_after_ms, 15_000);
    assert_eq!(config.chain_timeout_ms, 5_000);
    assert_eq!(config.eip1193_proxy_url, None);

    let controller = config.controller_config();
    assert_eq!(controller.prompt_after, Duration::from_secs(1));
    assert_eq!(controller.attention_after, Duration::from_secs(15));
    assert_eq!(controller.chain_timeout, Duration::from_secs(5));
}

#[test]
fn reads_every_key() {
    let config = WalletAdapterConfig::from_lookup(lookup(&[
        ("GPU_WALLET_FALLBACK_ADDRESS", "0x000000000000000000000000000000000000beef"),
        ("GPU_WALLET_ALLOWED_CHAINS", "1, 0x2105"),
        ("GPU_WALLET_PROMPT_AFTER_MS", "250"),
        ("GPU_WALLET_ATTENTION_AFTER_MS", " 5000 "),
        ("GPU_WALLET_CHAIN_TIMEOUT_MS", "750"),
        ("GPU_WALLET_EIP1193_PROXY_URL", "http://127.0.0.1:8545/eip1193 "),
        ("GPU_WALLET_PROXY_TIMEOUT_MS", "2000"),
        ("GPU_WALLET_PROXY_NAME", "Rabby bridge"),
    ]))
    .expect("valid config");

    assert_eq!(
        config.fallback_wallet,
        "0x000000000000000000000000000000000000BEEF".parse().ok()
    );
    assert_eq!(config.allowed_chains.ids(), ["0x1", "0x2105"]);
    assert_eq!(config.prompt_after_ms, 250);
    assert_eq!(config.attention_after_ms, 5_000);
    assert_eq!(config.chain_timeout_ms, 750);
    assert_eq!(
        config.eip1193_proxy_url.as_deref(),
        Some("http://127.0.0.1:8545/eip1193")
    );
    assert_eq!(config.proxy_timeout_ms, 2_000);
    assert_eq!(config.proxy_name.as_deref(), Some("Rabby bridge"));
    assert_eq!(
        config.controller_config().env_wallet,
        config.fallback_wallet
    );
}

#[test]
fn zero_or_garbage_fallback_means_no_fallback() {
    for raw in [
        "0x0000000000000000000000000000000000000000",
        "not-an-address",
        "   ",
    ] {
        let config = WalletAdapterConfig::from_lookup(lookup(&[(
            "GPU_WALLET_FALLBACK_ADDRESS",
            raw,
        )]))
        .expect("fallback problems are not fatal");
        assert_eq!(config.fallback_wallet, None, "{raw:?}");
    }
}

#[test]
fn rejects_non_numeric_deadline() {
    let err = WalletAdapterConfig::from_lookup(lookup(&[("GPU_WALLET_PROMPT_AFTER_MS", "soon")]))
        .expect_err("not a number");
    assert!(matches!(
        err,
        ConfigError::InvalidMillis { key: "GPU_WALLET_PROMPT_AFTER_MS", .. }
    ));
}

#[test]
fn attention_must_follow_prompt() {
    let err = WalletAdapterConfig::from_lookup(lookup(&[
        ("GPU_WALLET_PROMPT_AFTER_MS", "3000"),
        ("GPU_WALLET_ATTENTION_AFTER_MS", "3000"),
    ]))
    .expect_err("stages out of order");
    assert!(matches!(
        err,
        ConfigError::StageOrder {
            prompt_ms: 3_000,
            attention_ms: 3_000
        }
    ));
}

#[test]
fn without_proxy_there_are_no_candidates() {
    let wallets = InjectedWallets::from_config(&WalletAdapterConfig::default())
        .expect("no proxy to build");
    assert!(wallets.candidates().is_empty());
}
