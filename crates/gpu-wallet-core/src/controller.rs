use std::future::Future;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alloy::primitives::Address;
use futures::future::{self, Either, FutureExt, LocalBoxFuture, Shared, WeakShared};

use crate::chain::{read_chain, ChainAllowList, ChainInfo};
use crate::discovery::{discover, Discovery};
use crate::domain::{WalletSnapshot, WalletStatus};
use crate::error::{normalize, WalletError, WalletErrorCode};
use crate::ports::{read_accounts, ProviderSource, RpcMethod, TimerPort};
use crate::state_machine::{accepts_prompt, failure_status, resting_status};
use crate::store::SnapshotStore;
use crate::subscription::Subscription;

pub const PROMPT_MESSAGE: &str = "Approve the connection request in your wallet.";

pub type ConnectOutcome = Result<Address, WalletError>;

type ConnectFuture = LocalBoxFuture<'static, ConnectOutcome>;

/// Shared by every caller that asked to connect while the request was open.
/// The request runs while at least one handle is being awaited; dropping the
/// last handle abandons it and returns the controller to rest.
pub type ConnectHandle = Shared<ConnectFuture>;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub env_wallet: Option<Address>,
    pub allowed_chains: ChainAllowList,
    pub prompt_after: Duration,
    pub attention_after: Duration,
    /// Upper bound on `eth_chainId`; a slower answer reads as unknown.
    pub chain_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            env_wallet: None,
            allowed_chains: ChainAllowList::default(),
            prompt_after: Duration::from_millis(1_000),
            attention_after: Duration::from_millis(15_000),
            chain_timeout: Duration::from_millis(5_000),
        }
    }
}

impl ControllerConfig {
    fn stages(&self) -> [(ConnectStage, Duration); 2] {
        [
            (ConnectStage::Prompting, self.prompt_after),
            (ConnectStage::Attention, self.attention_after),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectStage {
    Prompting,
    Attention,
}

#[derive(Default)]
struct ControllerState {
    in_flight: Option<WeakShared<ConnectFuture>>,
    ticket: u64,
    /// Ticket whose stage timers may still write the snapshot.
    armed: Option<u64>,
    /// Bumped by every authoritative account write.
    revision: u64,
}

struct Inner<S, T> {
    source: S,
    timer: T,
    config: ControllerConfig,
    store: SnapshotStore,
    state: Mutex<ControllerState>,
}

/// Travels inside the connect future. Dropped unsettled means every handle
/// went away before the wallet answered.
struct ConnectGuard<S, T>
where
    S: ProviderSource,
    T: TimerPort,
{
    controller: WalletController<S, T>,
    ticket: u64,
    settled: bool,
}

impl<S, T> Drop for ConnectGuard<S, T>
where
    S: ProviderSource,
    T: TimerPort,
{
    fn drop(&mut self) {
        if !self.settled {
            self.controller.abandon_connect(self.ticket);
        }
    }
}

struct RefreshRead {
    accounts: Result<Vec<Address>, WalletError>,
    chain: ChainInfo,
    discovery_error: Option<WalletError>,
}

/// Owns the wallet lifecycle and is the only writer of the snapshot.
pub struct WalletController<S, T> {
    inner: Arc<Inner<S, T>>,
}

impl<S, T> Clone for WalletController<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, T> WalletController<S, T>
where
    S: ProviderSource,
    T: TimerPort,
{
    pub fn new(source: S, timer: T, config: ControllerConfig) -> Self {
        let store = SnapshotStore::new(WalletSnapshot::new(config.env_wallet));
        Self {
            inner: Arc::new(Inner {
                source,
                timer,
                config,
                store,
                state: Mutex::new(ControllerState::default()),
            }),
        }
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        self.inner.store.snapshot()
    }

    pub fn active_wallet(&self) -> Option<Address> {
        self.snapshot().active_wallet()
    }

    pub fn subscribe(&self, listener: impl Fn(&WalletSnapshot) + 'static) -> Subscription {
        self.inner.store.subscribe(listener)
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.inner.store
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn discover(&self) -> Discovery<S::Provider> {
        discover(&self.inner.source)
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts, or joins, the single outstanding `eth_requestAccounts` call.
    pub fn connect(&self) -> ConnectHandle {
        let discovery = self.discover();
        let Some(provider) = discovery.provider.clone() else {
            let error = discovery
                .error
                .clone()
                .unwrap_or_else(WalletError::unavailable);
            tracing::warn!(code = %error.code(), "connect requested without a usable provider");
            self.inner.store.update(|s| {
                apply_discovery(s, &discovery);
                s.status = failure_status(
                    error.code(),
                    s.connected_wallet.is_some(),
                    s.env_wallet.is_some(),
                );
                s.set_error(error.clone());
            });
            return future::ready(Err(error)).boxed_local().shared();
        };

        enum Start {
            Joined(ConnectHandle),
            AlreadyConnected(Address),
            Fresh(ConnectHandle),
        }

        let start = {
            let mut g = self.state();
            if let Some(pending) = g.in_flight.as_ref().and_then(WeakShared::upgrade) {
                Start::Joined(pending)
            } else if let Some(address) = self.inner.store.snapshot().connected_wallet {
                Start::AlreadyConnected(address)
            } else {
                g.ticket += 1;
                let ticket = g.ticket;
                g.armed = Some(ticket);
                let guard = ConnectGuard {
                    controller: self.clone(),
                    ticket,
                    settled: false,
                };
                let handle = run_connect(guard, provider).boxed_local().shared();
                g.in_flight = handle.downgrade();
                Start::Fresh(handle)
            }
        };

        match start {
            Start::Joined(handle) => {
                tracing::debug!("connect joined the open wallet request");
                self.inner.store.update(|s| {
                    apply_discovery(s, &discovery);
                    s.status = WalletStatus::Attention;
                    s.set_error(WalletError::request_pending());
                });
                handle
            }
            Start::AlreadyConnected(address) => future::ready(Ok(address)).boxed_local().shared(),
            Start::Fresh(handle) => {
                tracing::debug!(provider = ?discovery.provider_name, "wallet connect started");
                self.inner.store.update(|s| {
                    apply_discovery(s, &discovery);
                    s.connecting = true;
                    s.status = WalletStatus::Checking;
                    s.clear_error();
                });
                handle
            }
        }
    }

    /// Drives `request` while the prompt and attention stages fire. The
    /// request itself is never cancelled.
    async fn await_with_nudges<F: Future>(&self, ticket: u64, request: F) -> F::Output {
        let mut request = pin!(request);
        let mut elapsed = Duration::ZERO;
        for (stage, deadline) in self.inner.config.stages() {
            let nudge = pin!(self.inner.timer.sleep(deadline.saturating_sub(elapsed)));
            match future::select(request.as_mut(), nudge).await {
                Either::Left((outcome, _)) => return outcome,
                Either::Right(((), _)) => {
                    elapsed = deadline;
                    self.enter_stage(ticket, stage);
                }
            }
        }
        request.await
    }

    fn enter_stage(&self, ticket: u64, stage: ConnectStage) {
        if self.state().armed != Some(ticket) {
            return;
        }
        match stage {
            ConnectStage::Prompting => {
                self.inner.store.update(|s| {
                    if s.connected_wallet.is_none() && accepts_prompt(s.status) {
                        s.status = WalletStatus::Prompting;
                        if s.error.is_none() {
                            s.message = Some(PROMPT_MESSAGE.to_owned());
                        }
                    }
                });
            }
            ConnectStage::Attention => {
                tracing::warn!(
                    ticket,
                    "wallet request unanswered; asking user to check the wallet"
                );
                self.inner.store.update(|s| {
                    if s.connected_wallet.is_none() {
                        s.status = WalletStatus::Attention;
                        s.set_error(WalletError::request_timeout());
                    }
                });
            }
        }
    }

    fn finish_connect(&self, ticket: u64, outcome: ConnectOutcome) -> ConnectOutcome {
        let revision = {
            let mut g = self.state();
            g.in_flight = None;
            if g.armed == Some(ticket) {
                g.armed = None;
            }
            g.revision += 1;
            g.revision
        };

        match outcome {
            Ok(address) => {
                tracing::info!(wallet = %address, "wallet connected");
                self.inner.store.update(|s| {
                    s.connected_wallet = Some(address);
                    s.status = WalletStatus::Connected;
                    s.clear_error();
                    s.connecting = false;
                    s.revision = revision;
                });
                Ok(address)
            }
            Err(error) => {
                tracing::warn!(
                    code = %error.code(),
                    detail = error.message(),
                    "wallet connect failed"
                );
                self.inner.store.update(|s| {
                    s.connecting = false;
                    s.revision = revision;
                    s.status = failure_status(
                        error.code(),
                        s.connected_wallet.is_some(),
                        s.env_wallet.is_some(),
                    );
                    s.set_error(error.clone());
                });
                Err(error)
            }
        }
    }

    fn abandon_connect(&self, ticket: u64) {
        {
            let mut g = self.state();
            if g.ticket != ticket {
                return;
            }
            g.in_flight = None;
            if g.armed == Some(ticket) {
                g.armed = None;
            }
        }
        tracing::debug!(ticket, "connect abandoned before the wallet answered");
        self.inner.store.update(|s| {
            s.connecting = false;
            let nudged = s.error.as_ref().map_or(true, |e| {
                matches!(
                    e.code(),
                    WalletErrorCode::WalletRequestPending | WalletErrorCode::WalletRequestTimeout
                )
            });
            if nudged {
                s.clear_error();
            }
            s.status = resting_status(s.connected_wallet.is_some(), s.env_wallet.is_some());
        });
    }

    async fn read_chain_bounded(&self, provider: &S::Provider) -> ChainInfo {
        let read = pin!(read_chain(provider, &self.inner.config.allowed_chains));
        let limit = pin!(self.inner.timer.sleep(self.inner.config.chain_timeout));
        match future::select(read, limit).await {
            Either::Left((chain, _)) => chain,
            Either::Right(((), _)) => {
                tracing::warn!("eth_chainId did not answer in time; chain left unknown");
                ChainInfo::unknown()
            }
        }
    }

    /// Re-reads provider, authorized accounts and chain without prompting.
    pub async fn refresh(&self) -> WalletSnapshot {
        let stamp = self.state().revision;
        let discovery = self.discover();
        let connecting = self.state().in_flight.is_some();
        self.inner.store.update(|s| {
            apply_discovery(s, &discovery);
            if discovery.provider.is_some() && !connecting && s.connected_wallet.is_none() {
                s.status = WalletStatus::Checking;
            }
        });

        let read = match &discovery.provider {
            Some(provider) => RefreshRead {
                accounts: read_accounts(provider, RpcMethod::Accounts)
                    .await
                    .map_err(normalize),
                chain: self.read_chain_bounded(provider).await,
                discovery_error: None,
            },
            None => RefreshRead {
                accounts: Ok(Vec::new()),
                chain: ChainInfo::unknown(),
                discovery_error: discovery.error.clone(),
            },
        };
        self.settle_refresh(stamp, read)
    }

    fn settle_refresh(&self, stamp: u64, read: RefreshRead) -> WalletSnapshot {
        let authoritative = {
            let mut g = self.state();
            if g.in_flight.is_some() || g.revision != stamp {
                None
            } else {
                g.revision += 1;
                Some(g.revision)
            }
        };
        if authoritative.is_none() {
            tracing::debug!(stamp, "refresh superseded; keeping account state");
        }

        let RefreshRead {
            accounts,
            chain,
            discovery_error,
        } = read;
        let (_, snapshot) = self.inner.store.update(|s| {
            apply_chain(s, &chain);
            let Some(revision) = authoritative else {
                return;
            };
            s.revision = revision;
            let has_env = s.env_wallet.is_some();
            match accounts {
                Ok(accounts) => {
                    s.connected_wallet = accounts.first().copied();
                    let has_connected = s.connected_wallet.is_some();
                    if let Some(error) = discovery_error {
                        s.status = failure_status(error.code(), has_connected, has_env);
                        s.set_error(error);
                    } else {
                        let stale_discovery =
                            s.error.as_ref().is_some_and(|e| e.code().is_discovery());
                        if has_connected || stale_discovery {
                            s.clear_error();
                        }
                        s.status = resting_status(has_connected, has_env);
                    }
                }
                Err(error) => {
                    tracing::warn!(code = %error.code(), "authorized account read failed");
                    let has_connected = s.connected_wallet.is_some();
                    s.status = if has_connected || has_env {
                        resting_status(has_connected, has_env)
                    } else {
                        WalletStatus::Error
                    };
                    s.set_error(error);
                }
            }
        });
        snapshot
    }

    /// Forgets the connected account locally. The provider's own permission
    /// grant is untouched, so a later refresh may restore the account.
    pub fn disconnect(&self) {
        let revision = {
            let mut g = self.state();
            g.armed = None;
            g.revision += 1;
            g.revision
        };
        tracing::info!("wallet disconnected locally");
        self.inner.store.update(|s| {
            s.connected_wallet = None;
            s.clear_error();
            s.status = resting_status(false, s.env_wallet.is_some());
            s.revision = revision;
        });
    }

    pub fn dismiss_error(&self) {
        self.inner.store.update(|s| {
            s.clear_error();
            s.status = resting_status(s.connected_wallet.is_some(), s.env_wallet.is_some());
        });
    }
}

async fn run_connect<S, T>(mut guard: ConnectGuard<S, T>, provider: S::Provider) -> ConnectOutcome
where
    S: ProviderSource,
    T: TimerPort,
{
    let ticket = guard.ticket;
    let request = read_accounts(&provider, RpcMethod::RequestAccounts);
    let outcome = match guard.controller.await_with_nudges(ticket, request).await {
        Ok(accounts) => accounts.first().copied().ok_or_else(|| {
            WalletError::new(WalletErrorCode::WalletUnknown, "no account returned")
        }),
        Err(failure) => Err(normalize(failure)),
    };
    guard.settled = true;
    let controller = guard.controller.clone();
    drop(guard);

    let outcome = controller.finish_connect(ticket, outcome);
    if outcome.is_ok() {
        let chain = controller.read_chain_bounded(&provider).await;
        controller.inner.store.update(|s| apply_chain(s, &chain));
    }
    outcome
}

fn apply_discovery<P>(snapshot: &mut WalletSnapshot, discovery: &Discovery<P>) {
    snapshot.provider_name = discovery.provider_name.clone();
    snapshot.has_provider = discovery.has_provider;
    snapshot.has_conflict = discovery.has_conflict;
}

fn apply_chain(snapshot: &mut WalletSnapshot, chain: &ChainInfo) {
    snapshot.chain_id = chain.chain_id.clone();
    snapshot.chain_name = chain.chain_name.clone();
    snapshot.chain_allowed = chain.allowed;
}
