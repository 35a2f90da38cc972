use std::future::Future;
use std::time::Duration;

use gpu_wallet_core::TimerPort;

/// Sleeps on the host event loop: tokio natively, `setTimeout` in the browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeTimer;

impl TimerPort for RuntimeTimer {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + 'static {
        #[cfg(target_arch = "wasm32")]
        {
            gloo_timers::future::sleep(duration)
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            tokio::time::sleep(duration)
        }
    }
}
