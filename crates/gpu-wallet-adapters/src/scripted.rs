//! Deterministic in-memory wallet for tests and offline runs.
//!
//! Mirrors the observable behavior of an injected wallet: silent reads only
//! return authorized accounts, prompts can be approved, rejected or held open,
//! and lifecycle events reach registered listeners.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::Address;
use futures::channel::oneshot;
use serde_json::Value;

use gpu_wallet_core::{
    EventListener, ProviderDescriptor, ProviderEvent, ProviderEventKind, ProviderFailure,
    ProviderSource, RpcMethod, Subscription, VisibilitySource, WalletProvider,
    RPC_USER_REJECTED,
};

/// How the scripted wallet answers `eth_requestAccounts`.
#[derive(Debug, Clone)]
pub enum Approval {
    Approve,
    Reject,
    Fail(ProviderFailure),
    /// Held open until [`ScriptedProvider::approve_deferred`] or
    /// [`ScriptedProvider::resolve_deferred`].
    Defer,
}

type Deferred = oneshot::Sender<Result<Value, ProviderFailure>>;
type SharedListener = Arc<dyn Fn(ProviderEvent)>;

struct ScriptedState {
    wallet_accounts: Vec<Address>,
    authorized: Vec<Address>,
    chain_id: Value,
    chain_read_fails: bool,
    account_read_fails: bool,
    approval: Approval,
    deferred: Vec<Deferred>,
    held: Vec<RpcMethod>,
    parked: Vec<(RpcMethod, Deferred)>,
    requests: Vec<RpcMethod>,
    listeners: Vec<(u64, ProviderEventKind, SharedListener)>,
    next_listener_id: u64,
}

#[derive(Clone)]
pub struct ScriptedProvider {
    descriptor: ProviderDescriptor,
    state: Arc<Mutex<ScriptedState>>,
}

impl fmt::Debug for ScriptedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.lock();
        f.debug_struct("ScriptedProvider")
            .field("descriptor", &self.descriptor)
            .field("authorized", &g.authorized)
            .field("chain_id", &g.chain_id)
            .field("approval", &g.approval)
            .field("listeners", &g.listeners.len())
            .finish()
    }
}

fn accounts_json(accounts: &[Address]) -> Value {
    Value::Array(
        accounts
            .iter()
            .map(|a| Value::String(a.to_string()))
            .collect(),
    )
}

impl ScriptedProvider {
    pub fn new(descriptor: ProviderDescriptor, wallet_accounts: Vec<Address>) -> Self {
        Self {
            descriptor,
            state: Arc::new(Mutex::new(ScriptedState {
                wallet_accounts,
                authorized: Vec::new(),
                chain_id: Value::String("0x1".to_owned()),
                chain_read_fails: false,
                account_read_fails: false,
                approval: Approval::Approve,
                deferred: Vec::new(),
                held: Vec::new(),
                parked: Vec::new(),
                requests: Vec::new(),
                listeners: Vec::new(),
                next_listener_id: 0,
            })),
        }
    }

    pub fn metamask(wallet_accounts: Vec<Address>) -> Self {
        Self::new(ProviderDescriptor::metamask(), wallet_accounts)
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_approval(&self, approval: Approval) {
        self.lock().approval = approval;
    }

    pub fn set_chain_id(&self, chain_id: impl Into<Value>) {
        self.lock().chain_id = chain_id.into();
    }

    pub fn fail_chain_reads(&self, fail: bool) {
        self.lock().chain_read_fails = fail;
    }

    pub fn fail_account_reads(&self, fail: bool) {
        self.lock().account_read_fails = fail;
    }

    /// Grants permission as if the user approved on a previous visit.
    pub fn authorize(&self) {
        let mut g = self.lock();
        g.authorized = g.wallet_accounts.clone();
    }

    /// Drops the permission grant without emitting an event.
    pub fn revoke(&self) {
        self.lock().authorized.clear();
    }

    /// Parks silent reads of `method` until [`Self::release`]. Prompts are
    /// scripted through [`Approval`] instead.
    pub fn hold(&self, method: RpcMethod) {
        let mut g = self.lock();
        if !g.held.contains(&method) {
            g.held.push(method);
        }
    }

    /// Answers parked reads of `method` from the state as it is now.
    pub fn release(&self, method: RpcMethod) {
        let (parked, answer) = {
            let mut g = self.lock();
            g.held.retain(|m| *m != method);
            let (parked, kept) = std::mem::take(&mut g.parked)
                .into_iter()
                .partition::<Vec<_>, _>(|(m, _)| *m == method);
            g.parked = kept;
            (parked, g.silent_answer(method))
        };
        for (_, sender) in parked {
            let _ = sender.send(answer.clone());
        }
    }

    pub fn parked_count(&self, method: RpcMethod) -> usize {
        self.lock().parked.iter().filter(|(m, _)| *m == method).count()
    }

    pub fn request_count(&self, method: RpcMethod) -> usize {
        self.lock().requests.iter().filter(|m| **m == method).count()
    }

    pub fn deferred_count(&self) -> usize {
        self.lock().deferred.len()
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Completes every held-open prompt as approved.
    pub fn approve_deferred(&self) {
        let (senders, accounts) = {
            let mut g = self.lock();
            g.authorized = g.wallet_accounts.clone();
            (std::mem::take(&mut g.deferred), accounts_json(&g.authorized))
        };
        for sender in senders {
            let _ = sender.send(Ok(accounts.clone()));
        }
    }

    pub fn resolve_deferred(&self, result: Result<Value, ProviderFailure>) {
        let senders = std::mem::take(&mut self.lock().deferred);
        for sender in senders {
            let _ = sender.send(result.clone());
        }
    }

    pub fn emit_accounts_changed(&self, accounts: Vec<Address>) {
        let payload = accounts_json(&accounts);
        self.lock().authorized = accounts;
        self.emit(ProviderEventKind::AccountsChanged, payload);
    }

    pub fn emit_chain_changed(&self, chain_id: &str) {
        self.lock().chain_id = Value::String(chain_id.to_owned());
        self.emit(
            ProviderEventKind::ChainChanged,
            Value::String(chain_id.to_owned()),
        );
    }

    pub fn emit(&self, kind: ProviderEventKind, payload: Value) {
        let listeners: Vec<SharedListener> = self
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(ProviderEvent {
                kind,
                payload: payload.clone(),
            });
        }
    }
}

impl ScriptedState {
    fn silent_answer(&self, method: RpcMethod) -> Result<Value, ProviderFailure> {
        match method {
            RpcMethod::Accounts if self.account_read_fails => Err(ProviderFailure::Transport(
                "wallet backend disconnected".to_owned(),
            )),
            RpcMethod::Accounts | RpcMethod::RequestAccounts => {
                Ok(accounts_json(&self.authorized))
            }
            RpcMethod::ChainId if self.chain_read_fails => Err(ProviderFailure::Transport(
                "chain id unavailable".to_owned(),
            )),
            RpcMethod::ChainId => Ok(self.chain_id.clone()),
        }
    }
}

enum Reply {
    Ready(Result<Value, ProviderFailure>),
    Pending(oneshot::Receiver<Result<Value, ProviderFailure>>),
}

impl WalletProvider for ScriptedProvider {
    fn descriptor(&self) -> ProviderDescriptor {
        self.descriptor.clone()
    }

    fn request(
        &self,
        method: RpcMethod,
    ) -> impl Future<Output = Result<Value, ProviderFailure>> + 'static {
        let reply = match self.state.lock() {
            Err(e) => Reply::Ready(Err(ProviderFailure::Transport(format!(
                "scripted provider lock poisoned: {e}"
            )))),
            Ok(mut g) => {
                g.requests.push(method);
                match method {
                    RpcMethod::Accounts | RpcMethod::ChainId if g.held.contains(&method) => {
                        let (tx, rx) = oneshot::channel();
                        g.parked.push((method, tx));
                        Reply::Pending(rx)
                    }
                    RpcMethod::Accounts | RpcMethod::ChainId => {
                        Reply::Ready(g.silent_answer(method))
                    }
                    RpcMethod::RequestAccounts => match g.approval.clone() {
                        Approval::Approve => {
                            g.authorized = g.wallet_accounts.clone();
                            Reply::Ready(Ok(accounts_json(&g.authorized)))
                        }
                        Approval::Reject => Reply::Ready(Err(ProviderFailure::Rpc {
                            code: RPC_USER_REJECTED,
                            message: "User rejected the request.".to_owned(),
                        })),
                        Approval::Fail(failure) => Reply::Ready(Err(failure)),
                        Approval::Defer => {
                            let (tx, rx) = oneshot::channel();
                            g.deferred.push(tx);
                            Reply::Pending(rx)
                        }
                    },
                }
            }
        };

        async move {
            match reply {
                Reply::Ready(result) => result,
                Reply::Pending(rx) => rx.await.unwrap_or_else(|_| {
                    Err(ProviderFailure::Transport(
                        "scripted request dropped".to_owned(),
                    ))
                }),
            }
        }
    }

    fn subscribe(&self, kind: ProviderEventKind, listener: EventListener) -> Option<Subscription> {
        let id = {
            let mut g = self.lock();
            let id = g.next_listener_id;
            g.next_listener_id += 1;
            g.listeners.push((id, kind, Arc::from(listener)));
            id
        };
        let state = Arc::downgrade(&self.state);
        Some(Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .retain(|(lid, _, _)| *lid != id);
            }
        }))
    }
}

/// Injected provider set that tests can change mid-session.
#[derive(Debug, Clone, Default)]
pub struct ScriptedWallets {
    providers: Arc<Mutex<Vec<ScriptedProvider>>>,
}

impl ScriptedWallets {
    pub fn new(providers: Vec<ScriptedProvider>) -> Self {
        Self {
            providers: Arc::new(Mutex::new(providers)),
        }
    }

    pub fn install(&self, provider: ScriptedProvider) {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(provider);
    }

    pub fn uninstall_all(&self) {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ProviderSource for ScriptedWallets {
    type Provider = ScriptedProvider;

    fn candidates(&self) -> Vec<ScriptedProvider> {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Clone, Default)]
pub struct ScriptedVisibility {
    listeners: Arc<Mutex<Vec<(u64, Arc<dyn Fn()>)>>>,
    next_id: Arc<Mutex<u64>>,
}

impl fmt::Debug for ScriptedVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedVisibility")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl ScriptedVisibility {
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn become_visible(&self) {
        let listeners: Vec<Arc<dyn Fn()>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl VisibilitySource for ScriptedVisibility {
    fn on_visible(&self, listener: Box<dyn Fn()>) -> Option<Subscription> {
        let id = {
            let mut next = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            *next += 1;
            *next
        };
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::from(listener)));
        let listeners = Arc::downgrade(&self.listeners);
        Some(Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|(lid, _)| *lid != id);
            }
        }))
    }
}
