use futures::channel::mpsc::{self, UnboundedReceiver};
use futures::StreamExt;

use crate::controller::WalletController;
use crate::ports::{
    EventListener, ProviderEvent, ProviderEventKind, ProviderSource, TimerPort, VisibilitySource,
    WalletProvider,
};
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeSignal {
    Provider(ProviderEventKind),
    Visible,
}

/// Forwards provider lifecycle events and foreground transitions into
/// [`WalletController::refresh`]. Dropping the bridge removes every listener.
///
/// Listeners are registered on the provider discovered at attach time; attach
/// a new bridge after the provider set changes.
#[derive(Debug)]
pub struct EventBridge {
    receiver: UnboundedReceiver<BridgeSignal>,
    subscriptions: Vec<Subscription>,
}

impl EventBridge {
    pub fn attach<S, T>(
        controller: &WalletController<S, T>,
        visibility: Option<&dyn VisibilitySource>,
    ) -> Self
    where
        S: ProviderSource,
        T: TimerPort,
    {
        let (sender, receiver) = mpsc::unbounded();
        let mut subscriptions = Vec::new();

        if let Some(provider) = controller.discover().provider {
            for kind in ProviderEventKind::ALL {
                let tx = sender.clone();
                let listener: EventListener = Box::new(move |event: ProviderEvent| {
                    let _ = tx.unbounded_send(BridgeSignal::Provider(event.kind));
                });
                match provider.subscribe(kind, listener) {
                    Some(sub) => subscriptions.push(sub),
                    None => tracing::debug!(event = kind.as_str(), "provider has no event hook"),
                }
            }
        }

        if let Some(visibility) = visibility {
            let tx = sender.clone();
            let hook = visibility.on_visible(Box::new(move || {
                let _ = tx.unbounded_send(BridgeSignal::Visible);
            }));
            if let Some(sub) = hook {
                subscriptions.push(sub);
            }
        }

        Self {
            receiver,
            subscriptions,
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn drain_queued(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(Some(signal)) = self.receiver.try_next() {
            tracing::debug!(?signal, "wallet bridge signal");
            drained += 1;
        }
        drained
    }

    /// Handles whatever is queued right now; a burst costs one refresh.
    pub async fn pump<S, T>(&mut self, controller: &WalletController<S, T>) -> usize
    where
        S: ProviderSource,
        T: TimerPort,
    {
        let drained = self.drain_queued();
        if drained > 0 {
            controller.refresh().await;
        }
        drained
    }

    /// Refreshes on every signal. Runs until dropped, or until the provider
    /// releases every listener it was given.
    pub async fn run<S, T>(mut self, controller: &WalletController<S, T>)
    where
        S: ProviderSource,
        T: TimerPort,
    {
        while let Some(signal) = self.receiver.next().await {
            let coalesced = self.drain_queued();
            tracing::debug!(?signal, coalesced, "wallet bridge refresh");
            controller.refresh().await;
        }
    }

    pub fn detach(self) {
        drop(self);
    }
}
