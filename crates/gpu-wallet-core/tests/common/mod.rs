#![allow(dead_code)]

use std::future::Future;

use serde_json::Value;

use gpu_wallet_core::{
    ProviderDescriptor, ProviderFailure, ProviderSource, RpcMethod, WalletProvider,
};

#[derive(Debug, Clone)]
pub struct StaticProvider {
    pub descriptor: ProviderDescriptor,
    pub accounts: Vec<String>,
    pub chain_id: Result<Value, ProviderFailure>,
}

impl StaticProvider {
    pub fn named(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            accounts: Vec::new(),
            chain_id: Ok(Value::String("0x1".to_owned())),
        }
    }

    pub fn with_chain(mut self, chain_id: Result<Value, ProviderFailure>) -> Self {
        self.chain_id = chain_id;
        self
    }
}

impl WalletProvider for StaticProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        self.descriptor.clone()
    }

    fn request(
        &self,
        method: RpcMethod,
    ) -> impl Future<Output = Result<Value, ProviderFailure>> + 'static {
        let result = match method {
            RpcMethod::Accounts | RpcMethod::RequestAccounts => {
                Ok(serde_json::json!(self.accounts))
            }
            RpcMethod::ChainId => self.chain_id.clone(),
        };
        async move { result }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<StaticProvider>);

impl ProviderSource for StaticSource {
    type Provider = StaticProvider;

    fn candidates(&self) -> Vec<StaticProvider> {
        self.0.clone()
    }
}

pub fn plain() -> ProviderDescriptor {
    ProviderDescriptor::default()
}

pub fn coinbase() -> ProviderDescriptor {
    ProviderDescriptor {
        is_coinbase_wallet: true,
        ..ProviderDescriptor::default()
    }
}
