use std::future::Future;

use serde_json::Value;

use gpu_wallet_core::{
    EventListener, ProviderDescriptor, ProviderEventKind, ProviderFailure, ProviderSource,
    RpcMethod, Subscription, WalletProvider,
};

use crate::config::{ConfigError, WalletAdapterConfig};

/// EIP-1193 handle: the injected `window.ethereum` object in the browser, or a
/// JSON-RPC proxy that fronts a wallet on native builds.
#[derive(Debug, Clone)]
pub struct Eip1193Provider {
    mode: ProviderMode,
    descriptor: ProviderDescriptor,
}

#[derive(Debug, Clone)]
enum ProviderMode {
    #[cfg(not(target_arch = "wasm32"))]
    Proxy(ProxyRuntime),
    #[cfg(target_arch = "wasm32")]
    Browser(wasm_bindgen::JsValue),
}

#[derive(Debug, Clone)]
#[cfg(not(target_arch = "wasm32"))]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl ProxyRuntime {
    async fn call(self, method: RpcMethod) -> Result<Value, ProviderFailure> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method.as_str(),
            "params": [],
        });
        let response = self
            .client
            .post(&self.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderFailure::Transport(format!("eip1193 proxy request failed: {e}")))?;
        let status = response.status();
        let body: Value = response.json().await.map_err(|e| {
            ProviderFailure::Transport(format!("eip1193 proxy json decode failed: {e}"))
        })?;
        if let Some(err) = body.get("error") {
            return Err(rpc_failure_from_json(err));
        }
        if !status.is_success() {
            return Err(ProviderFailure::Transport(format!(
                "eip1193 proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| ProviderFailure::Transport("eip1193 proxy missing result".to_owned()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn rpc_failure_from_json(err: &Value) -> ProviderFailure {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("wallet returned an error")
        .to_owned();
    match err.get("code").and_then(Value::as_i64) {
        Some(code) => ProviderFailure::Rpc { code, message },
        None => ProviderFailure::Transport(message),
    }
}

impl Eip1193Provider {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn proxy(config: &WalletAdapterConfig, base_url: &str) -> Result<Self, ConfigError> {
        // eth_requestAccounts waits on the user indefinitely; only connection setup is bounded.
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_millis(config.proxy_timeout_ms))
            .build()
            .map_err(|e| ConfigError::ProxyClient(e.to_string()))?;
        Ok(Self {
            mode: ProviderMode::Proxy(ProxyRuntime {
                base_url: base_url.to_owned(),
                client,
            }),
            descriptor: ProviderDescriptor {
                label: Some(
                    config
                        .proxy_name
                        .clone()
                        .unwrap_or_else(|| "EIP-1193 proxy".to_owned()),
                ),
                ..ProviderDescriptor::default()
            },
        })
    }

    #[cfg(target_arch = "wasm32")]
    fn browser(handle: wasm_bindgen::JsValue) -> Self {
        let descriptor = browser::descriptor(&handle);
        Self {
            mode: ProviderMode::Browser(handle),
            descriptor,
        }
    }
}

impl WalletProvider for Eip1193Provider {
    fn descriptor(&self) -> ProviderDescriptor {
        self.descriptor.clone()
    }

    fn request(
        &self,
        method: RpcMethod,
    ) -> impl Future<Output = Result<Value, ProviderFailure>> + 'static {
        let mode = self.mode.clone();
        async move {
            match mode {
                #[cfg(not(target_arch = "wasm32"))]
                ProviderMode::Proxy(proxy) => proxy.call(method).await,
                #[cfg(target_arch = "wasm32")]
                ProviderMode::Browser(handle) => browser::request(&handle, method).await,
            }
        }
    }

    fn subscribe(&self, kind: ProviderEventKind, listener: EventListener) -> Option<Subscription> {
        match &self.mode {
            #[cfg(not(target_arch = "wasm32"))]
            ProviderMode::Proxy(_) => {
                let _ = (kind, listener);
                None
            }
            #[cfg(target_arch = "wasm32")]
            ProviderMode::Browser(handle) => browser::subscribe(handle, kind, listener),
        }
    }
}

/// The set of EIP-1193 handles visible to this process, re-read on each call.
#[derive(Debug, Clone, Default)]
pub struct InjectedWallets {
    #[cfg(not(target_arch = "wasm32"))]
    proxy: Option<Eip1193Provider>,
}

impl InjectedWallets {
    pub fn from_config(config: &WalletAdapterConfig) -> Result<Self, ConfigError> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let proxy = match &config.eip1193_proxy_url {
                Some(url) => Some(Eip1193Provider::proxy(config, url)?),
                None => {
                    tracing::info!("no EIP-1193 proxy configured; wallet will report unavailable");
                    None
                }
            };
            Ok(Self { proxy })
        }
        #[cfg(target_arch = "wasm32")]
        {
            let _ = config;
            Ok(Self {})
        }
    }
}

impl ProviderSource for InjectedWallets {
    type Provider = Eip1193Provider;

    fn candidates(&self) -> Vec<Eip1193Provider> {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.proxy.iter().cloned().collect()
        }
        #[cfg(target_arch = "wasm32")]
        {
            browser::injected_handles()
                .into_iter()
                .map(Eip1193Provider::browser)
                .collect()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::PageVisibility;

#[cfg(target_arch = "wasm32")]
mod browser {
    use gpu_wallet_core::{
        EventListener, ProviderDescriptor, ProviderEvent, ProviderEventKind, ProviderFailure,
        RpcMethod, Subscription, VisibilitySource,
    };
    use serde_json::Value;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};

    fn get_prop(target: &JsValue, key: &str) -> Option<JsValue> {
        js_sys::Reflect::get(target, &JsValue::from_str(key))
            .ok()
            .filter(|v| !v.is_null() && !v.is_undefined())
    }

    fn get_fn(target: &JsValue, key: &str) -> Option<js_sys::Function> {
        get_prop(target, key).and_then(|v| v.dyn_into::<js_sys::Function>().ok())
    }

    fn flag(target: &JsValue, key: &str) -> bool {
        get_prop(target, key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// `window.ethereum.providers` when extensions multi-inject, else `window.ethereum`.
    pub(super) fn injected_handles() -> Vec<JsValue> {
        let Some(window) = web_sys::window() else {
            return Vec::new();
        };
        let Some(ethereum) = get_prop(&window.into(), "ethereum") else {
            return Vec::new();
        };
        if let Some(list) = get_prop(&ethereum, "providers") {
            if js_sys::Array::is_array(&list) {
                let handles: Vec<JsValue> = js_sys::Array::from(&list)
                    .iter()
                    .filter(|p| !p.is_null() && !p.is_undefined())
                    .collect();
                if !handles.is_empty() {
                    return handles;
                }
            }
        }
        vec![ethereum]
    }

    pub(super) fn descriptor(handle: &JsValue) -> ProviderDescriptor {
        ProviderDescriptor {
            is_metamask: flag(handle, "isMetaMask"),
            is_coinbase_wallet: flag(handle, "isCoinbaseWallet"),
            is_brave_wallet: flag(handle, "isBraveWallet"),
            is_rabby: flag(handle, "isRabby"),
            label: None,
        }
    }

    fn failure_from_js(err: JsValue) -> ProviderFailure {
        let message = get_prop(&err, "message")
            .and_then(|v| v.as_string())
            .or_else(|| err.as_string())
            .unwrap_or_else(|| format!("{err:?}"));
        match get_prop(&err, "code").and_then(|v| v.as_f64()) {
            Some(code) => ProviderFailure::Rpc {
                code: code as i64,
                message,
            },
            None => ProviderFailure::Transport(message),
        }
    }

    pub(super) async fn request(
        handle: &JsValue,
        method: RpcMethod,
    ) -> Result<Value, ProviderFailure> {
        let request_fn = get_fn(handle, "request").ok_or(ProviderFailure::NotImplemented(
            "window.ethereum.request is unavailable",
        ))?;
        let request = serde_json::json!({ "method": method.as_str(), "params": [] });
        let request_js = serde_wasm_bindgen::to_value(&request).map_err(|e| {
            ProviderFailure::Transport(format!("failed to encode wasm request: {e}"))
        })?;
        let promise_js = request_fn
            .call1(handle, &request_js)
            .map_err(failure_from_js)?;
        let promise = promise_js.dyn_into::<js_sys::Promise>().map_err(|_| {
            ProviderFailure::Transport("provider request did not return Promise".to_owned())
        })?;
        let result_js = wasm_bindgen_futures::JsFuture::from(promise)
            .await
            .map_err(failure_from_js)?;
        serde_wasm_bindgen::from_value(result_js)
            .map_err(|e| ProviderFailure::Transport(format!("failed to decode wasm response: {e}")))
    }

    pub(super) fn subscribe(
        handle: &JsValue,
        kind: ProviderEventKind,
        listener: EventListener,
    ) -> Option<Subscription> {
        let on_fn = get_fn(handle, "on").or_else(|| get_fn(handle, "addListener"))?;
        let remove_fn = get_fn(handle, "removeListener");

        let callback = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let payload = serde_wasm_bindgen::from_value(value).unwrap_or(Value::Null);
            listener(ProviderEvent { kind, payload });
        });
        if let Err(e) = on_fn.call2(
            handle,
            &JsValue::from_str(kind.as_str()),
            callback.as_ref().unchecked_ref(),
        ) {
            tracing::warn!(
                event = kind.as_str(),
                error = ?e,
                "provider listener registration failed"
            );
            return None;
        }

        let handle = handle.clone();
        Some(Subscription::new(move || {
            if let Some(remove_fn) = remove_fn {
                let _ = remove_fn.call2(
                    &handle,
                    &JsValue::from_str(kind.as_str()),
                    callback.as_ref().unchecked_ref(),
                );
            }
            drop(callback);
        }))
    }

    /// Foreground transitions of the current document.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PageVisibility;

    impl VisibilitySource for PageVisibility {
        fn on_visible(&self, listener: Box<dyn Fn()>) -> Option<Subscription> {
            let document = web_sys::window()?.document()?;
            let probe = document.clone();
            let callback = Closure::<dyn FnMut()>::new(move || {
                if probe.visibility_state() == web_sys::VisibilityState::Visible {
                    listener();
                }
            });
            document
                .add_event_listener_with_callback(
                    "visibilitychange",
                    callback.as_ref().unchecked_ref(),
                )
                .ok()?;
            Some(Subscription::new(move || {
                let _ = document.remove_event_listener_with_callback(
                    "visibilitychange",
                    callback.as_ref().unchecked_ref(),
                );
                drop(callback);
            }))
        }
    }
}
