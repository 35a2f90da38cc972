pub mod config;
pub mod eip1193;
pub mod scripted;
pub mod timer;

pub use config::{ConfigError, WalletAdapterConfig};
pub use eip1193::{Eip1193Provider, InjectedWallets};
#[cfg(target_arch = "wasm32")]
pub use eip1193::PageVisibility;
pub use scripted::{Approval, ScriptedProvider, ScriptedVisibility, ScriptedWallets};
pub use timer::RuntimeTimer;
