use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::domain::WalletSnapshot;
use crate::subscription::Subscription;

type Listener = Arc<dyn Fn(&WalletSnapshot)>;

struct StoreState {
    snapshot: WalletSnapshot,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

/// Single source of truth for [`WalletSnapshot`]; notifies listeners on change.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<Mutex<StoreState>>,
}

fn lock_state(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SnapshotStore {
    pub fn new(initial: WalletSnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreState {
                snapshot: initial,
                listeners: Vec::new(),
                next_listener_id: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        lock_state(&self.inner).snapshot.clone()
    }

    /// Listener runs after every published transition until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, listener: impl Fn(&WalletSnapshot) + 'static) -> Subscription {
        let id = {
            let mut g = lock_state(&self.inner);
            let id = g.next_listener_id;
            g.next_listener_id += 1;
            g.listeners.push((id, Arc::new(listener)));
            id
        };
        let weak: Weak<Mutex<StoreState>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock_state(&inner).listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        lock_state(&self.inner).listeners.len()
    }

    /// Applies `mutate` and publishes the result. Listeners run with no lock
    /// held, so they may call back into the controller.
    pub(crate) fn update<R>(
        &self,
        mutate: impl FnOnce(&mut WalletSnapshot) -> R,
    ) -> (R, WalletSnapshot) {
        let (result, published, listeners) = {
            let mut g = lock_state(&self.inner);
            let before = g.snapshot.clone();
            let result = mutate(&mut g.snapshot);
            if g.snapshot == before {
                return (result, before);
            }
            if g.snapshot.status != before.status {
                tracing::debug!(from = ?before.status, to = ?g.snapshot.status, "wallet status");
            }
            let listeners: Vec<Listener> = g.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            (result, g.snapshot.clone(), listeners)
        };
        for listener in &listeners {
            listener(&published);
        }
        (result, published)
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let g = lock_state(&self.inner);
        f.debug_struct("SnapshotStore")
            .field("snapshot", &g.snapshot)
            .field("listeners", &g.listeners.len())
            .finish()
    }
}
