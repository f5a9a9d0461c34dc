//! Test utilities for pwa-kit.
//!
//! - `FakeHost`: a scripted [`Host`] that records every call in order
//! - `LogCapture`: a tracing layer that records emitted events
//!
//! Available in this crate's tests and, with the `test-utils` feature, to
//! downstream crates.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::error::{HostError, HostResult};
use crate::event::{LifecycleEvent, LifecycleEventKind};
use crate::host::{Host, Listener, ScriptProbe, WorkerHandle};

/// A call made against the fake host or one of its workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Probe(String),
    CreateWorker { url: String, scope: String },
    AddListener(LifecycleEventKind),
    Register,
    HasRegistration(String),
    Confirm(String),
    Reload,
}

type CallLog = Rc<RefCell<Vec<HostCall>>>;

/// Scripted host. Defaults: supported, registration succeeds, probe returns
/// `200 application/javascript`, nothing registered, not standalone, and the
/// user confirms updates.
#[derive(Debug)]
pub struct FakeHost {
    supported: bool,
    probe: HostResult<ScriptProbe>,
    registration: HostResult<()>,
    existing: HostResult<bool>,
    display_mode: HostResult<bool>,
    ios_standalone: HostResult<bool>,
    confirm_answer: Cell<bool>,
    calls: CallLog,
    workers: RefCell<Vec<Rc<FakeWorker>>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            supported: true,
            probe: Ok(ScriptProbe::new(200, Some("application/javascript"))),
            registration: Ok(()),
            existing: Ok(false),
            display_mode: Ok(false),
            ios_standalone: Ok(false),
            confirm_answer: Cell::new(true),
            calls: Rc::new(RefCell::new(Vec::new())),
            workers: RefCell::new(Vec::new()),
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// No service worker capability.
    #[must_use]
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    /// The platform rejects registration with `cause`.
    #[must_use]
    pub fn rejecting_registration(mut self, cause: &str) -> Self {
        self.registration = Err(HostError::Rejected(cause.to_string()));
        self
    }

    #[must_use]
    pub fn with_probe(mut self, probe: HostResult<ScriptProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Result of the registration lookup.
    #[must_use]
    pub fn with_existing_registration(mut self, existing: HostResult<bool>) -> Self {
        self.existing = existing;
        self
    }

    #[must_use]
    pub fn with_display_mode(mut self, standalone: HostResult<bool>) -> Self {
        self.display_mode = standalone;
        self
    }

    #[must_use]
    pub fn with_ios_standalone(mut self, standalone: HostResult<bool>) -> Self {
        self.ios_standalone = standalone;
        self
    }

    /// The user answers "Cancel" to update prompts.
    #[must_use]
    pub fn declining_updates(self) -> Self {
        self.confirm_answer.set(false);
        self
    }

    /// Snapshot of all calls so far, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Number of listeners attached to the most recent worker.
    pub fn listener_count(&self) -> usize {
        self.workers
            .borrow()
            .last()
            .map_or(0, |w| w.listeners.borrow().len())
    }

    /// Delivers `event` to the matching listeners of the most recent worker,
    /// as the platform would.
    pub fn emit(&self, event: LifecycleEvent) {
        let worker = self.workers.borrow().last().cloned();
        if let Some(worker) = worker {
            worker.emit(&event);
        }
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl Host for FakeHost {
    fn supports_service_worker(&self) -> bool {
        self.supported
    }

    fn create_worker(&self, url: &str, scope: &str) -> HostResult<Rc<dyn WorkerHandle>> {
        self.record(HostCall::CreateWorker {
            url: url.to_string(),
            scope: scope.to_string(),
        });
        let worker = Rc::new(FakeWorker {
            calls: Rc::clone(&self.calls),
            listeners: RefCell::new(Vec::new()),
            result: self.registration.clone(),
        });
        self.workers.borrow_mut().push(Rc::clone(&worker));
        Ok(worker)
    }

    async fn probe_script(&self, url: &str) -> HostResult<ScriptProbe> {
        self.record(HostCall::Probe(url.to_string()));
        self.probe.clone()
    }

    async fn has_registration(&self, scope: &str) -> HostResult<bool> {
        self.record(HostCall::HasRegistration(scope.to_string()));
        self.existing.clone()
    }

    fn display_mode_standalone(&self) -> HostResult<bool> {
        self.display_mode.clone()
    }

    fn navigator_standalone(&self) -> HostResult<bool> {
        self.ios_standalone.clone()
    }

    fn confirm(&self, message: &str) -> bool {
        self.record(HostCall::Confirm(message.to_string()));
        self.confirm_answer.get()
    }

    fn reload(&self) {
        self.record(HostCall::Reload);
    }
}

/// Worker created by [`FakeHost`].
pub struct FakeWorker {
    calls: CallLog,
    listeners: RefCell<Vec<(LifecycleEventKind, Listener)>>,
    result: HostResult<()>,
}

impl FakeWorker {
    fn emit(&self, event: &LifecycleEvent) {
        // Clone out so listeners may touch the host without a live borrow.
        let matching: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(kind, _)| *kind == event.kind)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in matching {
            listener(event);
        }
    }
}

impl std::fmt::Debug for FakeWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeWorker")
            .field("listeners", &self.listeners.borrow().len())
            .field("result", &self.result)
            .finish()
    }
}

#[async_trait(?Send)]
impl WorkerHandle for FakeWorker {
    fn add_listener(&self, kind: LifecycleEventKind, listener: Listener) {
        self.calls.borrow_mut().push(HostCall::AddListener(kind));
        self.listeners.borrow_mut().push((kind, listener));
    }

    async fn register(&self) -> HostResult<()> {
        self.calls.borrow_mut().push(HostCall::Register);
        self.result.clone()
    }
}

/// A log line captured by [`LogCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLog {
    pub level: Level,
    pub message: String,
}

/// Tracing layer that keeps every event for later assertions.
#[derive(Debug, Clone, Default)]
pub struct LogCapture {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
}

impl LogCapture {
    /// Installs a capturing subscriber for the current thread.
    ///
    /// Events are recorded until the returned guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn logs(&self) -> Vec<CapturedLog> {
        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Captured lines at exactly `level`.
    pub fn at(&self, level: Level) -> Vec<CapturedLog> {
        self.logs().into_iter().filter(|l| l.level == level).collect()
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.logs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedLog {
                level: *event.metadata().level(),
                message: visitor.message,
            });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
