#![forbid(unsafe_code)]

//! `wasm-bindgen` exports. Only compiled on `wasm32` targets.

use core::future::Future;
use core::pin::Pin;
use std::rc::Rc;

use js_sys::{Object, Reflect};
use keypress_core::{
    Completion, ForwardStats, Forwarder, KeyDown, KeypressRequest, Reloader, Transport,
    TransportError,
};
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{EventTarget, KeyboardEvent, RequestInit, Response, Window};

use crate::console;
use crate::options::InstallOptions;

const KEYDOWN: &str = "keydown";

type PageForwarder = Forwarder<FetchTransport, LocationReloader>;

fn console_error(msg: &str) {
    web_sys::console::error_2(&JsValue::from_str("Error:"), &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn describe_js(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn set_js(obj: &Object, key: &str, value: JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(key), &value);
}

fn stats_to_js(stats: ForwardStats) -> JsValue {
    let obj = Object::new();
    set_js(&obj, "keysSeen", JsValue::from_f64(stats.keys_seen as f64));
    set_js(&obj, "keysRejected", JsValue::from_f64(stats.keys_rejected as f64));
    set_js(&obj, "requestsIssued", JsValue::from_f64(stats.requests_issued as f64));
    set_js(&obj, "requestsFailed", JsValue::from_f64(stats.requests_failed as f64));
    set_js(&obj, "reloads", JsValue::from_f64(stats.reloads as f64));
    obj.into()
}

fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

/// `window.fetch(path, { method: "GET" })`. The response body is never read.
pub struct FetchTransport {
    window: Window,
}

impl FetchTransport {
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self { window: window()? })
    }
}

impl Transport for FetchTransport {
    type Pending = Pin<Box<dyn Future<Output = Completion>>>;

    fn issue(&self, request: &KeypressRequest) -> Self::Pending {
        let init = RequestInit::new();
        init.set_method(request.method());
        let promise = self.window.fetch_with_str_and_init(&request.path, &init);
        let path = request.path.clone();
        Box::pin(async move {
            let completion = settle_fetch(promise).await;
            if let Err(err) = &completion {
                console_error(&console::failure_message(&path, err));
            }
            completion
        })
    }
}

async fn settle_fetch(promise: js_sys::Promise) -> Completion {
    let value = JsFuture::from(promise)
        .await
        .map_err(|err| TransportError::Rejected(describe_js(&err)))?;
    let response: Response = value.dyn_into().map_err(|_| {
        TransportError::Rejected("fetch resolved to a non-Response value".to_string())
    })?;
    if response.ok() {
        Ok(())
    } else {
        Err(TransportError::Status(response.status()))
    }
}

/// `window.location.reload()`.
pub struct LocationReloader {
    window: Window,
}

impl LocationReloader {
    pub fn new() -> Result<Self, JsValue> {
        Ok(Self { window: window()? })
    }
}

impl Reloader for LocationReloader {
    fn reload(&self) {
        if let Err(err) = self.window.location().reload() {
            warn!(error = %describe_js(&err), "location.reload() failed");
        }
    }
}

fn dispatch(forwarder: &PageForwarder, event: KeyDown) {
    // Rejected keys are already logged by the forwarder.
    if let Ok(dispatch) = forwarder.on_key_down(&event) {
        spawn_local(async move {
            let _ = dispatch.settle.await;
        });
    }
}

/// Registered `keydown` listener; removed from the document on drop.
struct KeydownListener {
    target: EventTarget,
    callback: Closure<dyn FnMut(KeyboardEvent)>,
}

impl KeydownListener {
    fn attach(target: EventTarget, forwarder: Rc<PageForwarder>) -> Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            dispatch(&forwarder, KeyDown::new(event.key()).repeated(event.repeat()));
        });
        target.add_event_listener_with_callback(KEYDOWN, callback.as_ref().unchecked_ref())?;
        Ok(Self { target, callback })
    }
}

impl Drop for KeydownListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(KEYDOWN, self.callback.as_ref().unchecked_ref());
    }
}

/// Handle returned by [`install`].
#[wasm_bindgen]
pub struct KeypressForwarder {
    forwarder: Rc<PageForwarder>,
    listener: Option<KeydownListener>,
}

#[wasm_bindgen]
impl KeypressForwarder {
    /// Counters: `{ keysSeen, keysRejected, requestsIssued, requestsFailed, reloads }`.
    pub fn stats(&self) -> JsValue {
        stats_to_js(self.forwarder.stats())
    }

    #[wasm_bindgen(getter, js_name = isAttached)]
    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Request target the given key would produce, without sending anything.
    #[wasm_bindgen(js_name = targetFor)]
    pub fn target_for(&self, key: &str) -> Result<String, JsValue> {
        KeypressRequest::build(self.forwarder.config(), key)
            .map(|request| request.path)
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Stop listening. Idempotent.
    pub fn detach(&mut self) {
        if self.listener.take().is_some() {
            info!("keydown listener detached");
        }
    }
}

/// Attach the forwarder to `document`.
///
/// `config_json` is the forwarder config as JSON (all fields optional);
/// `log_level` is a `tracing` level name (`"info"` when absent).
#[wasm_bindgen]
pub fn install(
    config_json: Option<String>,
    log_level: Option<String>,
) -> Result<KeypressForwarder, JsValue> {
    install_panic_hook();
    let options = InstallOptions::parse(config_json.as_deref(), log_level.as_deref())
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    console::init(options.log_level);

    let window = window()?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;
    let transport = FetchTransport {
        window: window.clone(),
    };
    let reloader = LocationReloader { window };
    let forwarder = Forwarder::new(options.config, transport, reloader)
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    let forwarder = Rc::new(forwarder);

    let listener = KeydownListener::attach(document.into(), Rc::clone(&forwarder))?;
    debug!(
        prefix = %forwarder.config().prefix,
        style = forwarder.config().style.label(),
        reload = forwarder.config().reload.label(),
        "keydown listener attached"
    );
    Ok(KeypressForwarder {
        forwarder,
        listener: Some(listener),
    })
}

#[cfg(feature = "autostart")]
#[wasm_bindgen(start)]
pub fn autostart() {
    match install(None, None) {
        // The page lives as long as the listener; nothing will detach it.
        Ok(handle) => std::mem::forget(handle),
        Err(err) => console_error(&describe_js(&err)),
    }
}
