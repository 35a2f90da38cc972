pub mod bridge;
pub mod chain;
pub mod controller;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod ports;
pub mod state_machine;
pub mod store;
pub mod subscription;

pub use bridge::{BridgeSignal, EventBridge};
pub use chain::{chain_name, normalize_chain_id, read_chain, ChainAllowList, ChainInfo};
pub use controller::{
    ConnectHandle, ConnectOutcome, ControllerConfig, WalletController, PROMPT_MESSAGE,
};
pub use discovery::{discover, Discovery};
pub use domain::{parse_configured_address, WalletSnapshot, WalletSource, WalletStatus};
pub use error::{
    normalize, ProviderFailure, WalletError, WalletErrorCode, RPC_REQUEST_PENDING,
    RPC_USER_REJECTED,
};
pub use ports::{
    accounts_from_value, read_accounts, EventListener, ProviderDescriptor, ProviderEvent,
    ProviderEventKind, ProviderSource, RpcMethod, TimerPort, VisibilitySource, WalletProvider,
};
pub use state_machine::{accepts_prompt, failure_status, resting_status};
pub use store::SnapshotStore;
pub use subscription::Subscription;
