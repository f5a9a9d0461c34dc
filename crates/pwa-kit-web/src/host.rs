//! `web-sys` implementation of the capability surface.
//!
//! The browser exposes raw `updatefound`, `statechange` and
//! `controllerchange` events. [`WebWorker`] folds them into the five
//! lifecycle kinds the coordinator listens for:
//!
//! | Browser signal                                  | Lifecycle kind |
//! |-------------------------------------------------|----------------|
//! | new worker reaches `installed`                  | `Installed`    |
//! | new worker reaches `activated`                  | `Activated`    |
//! | worker already waiting when registration lands  | `Waiting`      |
//! | `controllerchange` on the container             | `Controlling`  |
//! | `error` on a tracked worker                     | `Error`        |
//!
//! An event counts as an update when the page already had a controller at
//! the time `register` was called.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use js_sys::Reflect;
use pwa_kit::{
    HostError, HostResult, LifecycleEvent, LifecycleEventKind, Listener, ScriptProbe, WorkerHandle,
};
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Event, EventTarget, RegistrationOptions, Request, RequestInit, Response, ServiceWorker,
    ServiceWorkerContainer, ServiceWorkerRegistration, ServiceWorkerState, Window,
};

use crate::error::{describe_js_error, js_error};

const STANDALONE_QUERY: &str = "(display-mode: standalone)";

/// The page's `window`, seen through the [`pwa_kit::Host`] trait.
#[derive(Debug, Clone)]
pub struct WebHost {
    window: Window,
}

impl WebHost {
    /// Binds to the global `window`. Fails outside a document context.
    pub fn new() -> HostResult<Self> {
        web_sys::window()
            .map(|window| Self { window })
            .ok_or_else(|| HostError::Unsupported("no global window".to_string()))
    }

    fn navigator_property(&self, name: &str) -> HostResult<JsValue> {
        Reflect::get(&self.window.navigator(), &JsValue::from_str(name)).map_err(js_error)
    }

    /// `navigator.serviceWorker`, checked by reflection since the typed
    /// getter assumes it exists.
    fn container(&self) -> HostResult<ServiceWorkerContainer> {
        let value = self.navigator_property("serviceWorker")?;
        if value.is_undefined() || value.is_null() {
            return Err(HostError::Unsupported(
                "navigator.serviceWorker is unavailable".to_string(),
            ));
        }

        value.dyn_into().map_err(|_| {
            HostError::Unexpected("navigator.serviceWorker is not a ServiceWorkerContainer".into())
        })
    }
}

#[async_trait(?Send)]
impl pwa_kit::Host for WebHost {
    fn supports_service_worker(&self) -> bool {
        self.container().is_ok()
    }

    fn create_worker(&self, url: &str, scope: &str) -> HostResult<Rc<dyn WorkerHandle>> {
        let container = self.container()?;
        Ok(Rc::new(WebWorker::new(container, url, scope)))
    }

    async fn probe_script(&self, url: &str) -> HostResult<ScriptProbe> {
        let init = RequestInit::new();
        init.set_method("HEAD");
        let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;

        let value = JsFuture::from(self.window.fetch_with_request(&request))
            .await
            .map_err(js_error)?;
        let response: Response = value
            .dyn_into()
            .map_err(|_| HostError::Unexpected("fetch did not resolve to a Response".into()))?;
        let content_type = response.headers().get("content-type").map_err(js_error)?;

        Ok(ScriptProbe {
            status: response.status(),
            content_type,
        })
    }

    async fn has_registration(&self, scope: &str) -> HostResult<bool> {
        let container = self.container()?;
        let value = JsFuture::from(container.get_registration_with_document_url(scope))
            .await
            .map_err(js_error)?;
        Ok(!value.is_undefined() && !value.is_null())
    }

    fn display_mode_standalone(&self) -> HostResult<bool> {
        let query = self.window.match_media(STANDALONE_QUERY).map_err(js_error)?;
        Ok(query.is_some_and(|list| list.matches()))
    }

    fn navigator_standalone(&self) -> HostResult<bool> {
        Ok(self.navigator_property("standalone")?.as_bool() == Some(true))
    }

    fn confirm(&self, message: &str) -> bool {
        self.window
            .confirm_with_message(message)
            .unwrap_or_else(|err| {
                warn!("confirm dialog unavailable: {}", describe_js_error(&err));
                false
            })
    }

    fn reload(&self) {
        if let Err(err) = self.window.location().reload() {
            warn!("page reload failed: {}", describe_js_error(&err));
        }
    }
}

/// A service worker script bound to a container, with its lifecycle
/// listeners. Registration happens on [`WorkerHandle::register`].
pub struct WebWorker {
    inner: Rc<WorkerState>,
}

struct WorkerState {
    container: ServiceWorkerContainer,
    url: String,
    scope: String,
    listeners: RefCell<Vec<(LifecycleEventKind, Listener)>>,
    // Detached from their targets on drop.
    attached: RefCell<Vec<AttachedListener>>,
    is_update: Cell<bool>,
}

struct AttachedListener {
    target: EventTarget,
    name: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl WebWorker {
    fn new(container: ServiceWorkerContainer, url: &str, scope: &str) -> Self {
        Self {
            inner: Rc::new(WorkerState {
                container,
                url: url.to_string(),
                scope: scope.to_string(),
                listeners: RefCell::new(Vec::new()),
                attached: RefCell::new(Vec::new()),
                is_update: Cell::new(false),
            }),
        }
    }
}

impl fmt::Debug for WebWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebWorker")
            .field("url", &self.inner.url)
            .field("scope", &self.inner.scope)
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("is_update", &self.inner.is_update.get())
            .finish()
    }
}

impl WorkerState {
    fn emit(&self, kind: LifecycleEventKind, message: Option<String>) {
        let is_update = self.is_update.get();
        let event = match message {
            Some(message) => LifecycleEvent::error(message, is_update),
            None => LifecycleEvent::new(kind, is_update),
        };
        debug!(kind = %event.kind, is_update, "service worker lifecycle event");

        // Clone out so a listener may attach further listeners.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }

    fn listen<F>(&self, target: &EventTarget, name: &'static str, handler: F) -> HostResult<()>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        self.attached.borrow_mut().push(AttachedListener {
            target: target.clone(),
            name,
            closure,
        });
        Ok(())
    }
}

impl Drop for WorkerState {
    // The container outlives every handle, including failed registrations.
    fn drop(&mut self) {
        for listener in self.attached.get_mut().drain(..) {
            let callback: &js_sys::Function = listener.closure.as_ref().unchecked_ref();
            if let Err(err) = listener
                .target
                .remove_event_listener_with_callback(listener.name, callback)
            {
                debug!(
                    event = listener.name,
                    "could not detach listener: {}",
                    describe_js_error(&err)
                );
            }
        }
    }
}

/// Follows one incoming worker through `installed` and `activated`.
fn track(state: &Rc<WorkerState>, worker: ServiceWorker) -> HostResult<()> {
    let weak: Weak<WorkerState> = Rc::downgrade(state);
    let incoming = worker.clone();
    state.listen(&worker, "statechange", move |_| {
        let Some(state) = weak.upgrade() else { return };
        match incoming.state() {
            ServiceWorkerState::Installed => state.emit(LifecycleEventKind::Installed, None),
            ServiceWorkerState::Activated => state.emit(LifecycleEventKind::Activated, None),
            _ => {}
        }
    })?;

    let weak = Rc::downgrade(state);
    state.listen(&worker, "error", move |event| {
        if let Some(state) = weak.upgrade() {
            let message = Reflect::get(&event, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
                .unwrap_or_else(|| "service worker error".to_string());
            state.emit(LifecycleEventKind::Error, Some(message));
        }
    })
}

#[async_trait(?Send)]
impl WorkerHandle for WebWorker {
    fn add_listener(&self, kind: LifecycleEventKind, listener: Listener) {
        self.inner.listeners.borrow_mut().push((kind, listener));
    }

    async fn register(&self) -> HostResult<()> {
        let state = &self.inner;
        state.is_update.set(state.container.controller().is_some());

        let weak = Rc::downgrade(state);
        state.listen(&state.container, "controllerchange", move |_| {
            if let Some(state) = weak.upgrade() {
                state.emit(LifecycleEventKind::Controlling, None);
            }
        })?;

        let options = RegistrationOptions::new();
        options.set_scope(&state.scope);
        let value = JsFuture::from(state.container.register_with_options(&state.url, &options))
            .await
            .map_err(js_error)?;
        let registration: ServiceWorkerRegistration = value.dyn_into().map_err(|_| {
            HostError::Unexpected("serviceWorker.register did not return a registration".into())
        })?;

        if registration.waiting().is_some() {
            state.emit(LifecycleEventKind::Waiting, None);
        }
        if let Some(installing) = registration.installing() {
            track(state, installing)?;
        }

        let weak = Rc::downgrade(state);
        let source = registration.clone();
        state.listen(&registration, "updatefound", move |_| {
            let Some(state) = weak.upgrade() else { return };
            if let Some(installing) = source.installing() {
                if let Err(err) = track(&state, installing) {
                    warn!("could not follow incoming service worker: {err}");
                }
            }
        })?;

        Ok(())
    }
}
