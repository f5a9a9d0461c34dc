//! Browser capability surface.
//!
//! This module defines the `Host` trait that abstracts everything the
//! coordinator needs from the browser: feature detection, worker
//! registration, lifecycle listeners, display-mode queries, the confirm
//! dialog and page reload. `pwa-kit-web` implements it with `web-sys`;
//! `test_utils::FakeHost` implements it for tests.
//!
//! Everything runs on the page's single event loop, so the traits are
//! `?Send` and shared through `Rc`.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;

use crate::error::HostResult;
use crate::event::{LifecycleEvent, LifecycleEventKind};

/// Callback attached to a worker for one lifecycle event kind.
pub type Listener = Rc<dyn Fn(&LifecycleEvent)>;

/// Response metadata from probing the worker script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptProbe {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header, if the server sent one
    pub content_type: Option<String>,
}

impl ScriptProbe {
    /// Creates a probe result.
    pub fn new(status: u16, content_type: Option<&str>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
        }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The page-level capabilities the coordinator consumes.
#[async_trait(?Send)]
pub trait Host: fmt::Debug {
    /// Whether the environment exposes service worker registration at all.
    fn supports_service_worker(&self) -> bool;

    /// Creates an unregistered worker bound to `url` and `scope`.
    ///
    /// Nothing is requested from the network until
    /// [`WorkerHandle::register`] is awaited.
    fn create_worker(&self, url: &str, scope: &str) -> HostResult<Rc<dyn WorkerHandle>>;

    /// Issues a HEAD request for the worker script.
    async fn probe_script(&self, url: &str) -> HostResult<ScriptProbe>;

    /// Whether a registration exists for `scope`.
    async fn has_registration(&self, scope: &str) -> HostResult<bool>;

    /// Whether `(display-mode: standalone)` matches.
    fn display_mode_standalone(&self) -> HostResult<bool>;

    /// iOS Safari's `navigator.standalone` flag.
    fn navigator_standalone(&self) -> HostResult<bool>;

    /// Shows a blocking yes/no dialog. Returns true when confirmed.
    fn confirm(&self, message: &str) -> bool;

    /// Reloads the page, discarding in-memory state.
    fn reload(&self);
}

/// A worker that has been created but possibly not yet registered.
#[async_trait(?Send)]
pub trait WorkerHandle: fmt::Debug {
    /// Attaches a listener for one event kind.
    fn add_listener(&self, kind: LifecycleEventKind, listener: Listener);

    /// Registers the worker; resolves once the platform confirms.
    async fn register(&self) -> HostResult<()>;
}
