//! # pwa-kit
//!
//! Service worker registration and update coordination for Progressive Web Apps.
//!
//! The crate is platform-independent: it talks to the browser through the
//! [`Host`] capability surface, which `pwa-kit-web` implements on top of
//! `web-sys`. Tests drive it with the scripted host in `test_utils`.
//!
//! ## Architecture
//!
//! - **ServiceWorkerCoordinator**: registers the worker and owns the handle
//! - **Host / WorkerHandle**: the capability surface the coordinator consumes
//! - **lifecycle**: maps lifecycle events to log lines and the update prompt
//! - **bootstrap**: caller-side policy that keeps a failed registration non-fatal
//! - **PwaConfig**: worker URL, scope and preflight policy
//!
//! ## Example Usage
//!
//! ```ignore
//! use pwa_kit::{PwaConfig, ServiceWorkerCoordinator};
//!
//! let coordinator = ServiceWorkerCoordinator::new(host, PwaConfig::default());
//!
//! match coordinator.register().await {
//!     Ok(()) => {}
//!     Err(err) => tracing::warn!("continuing without offline support: {err}"),
//! }
//!
//! if coordinator.is_installed() {
//!     // running as an installed app
//! }
//! ```

pub mod bootstrap;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod host;
pub mod lifecycle;
pub mod logging;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use bootstrap::{StartupReport, start};
pub use config::{PreflightPolicy, PwaConfig};
pub use coordinator::{RegistrationHandle, ServiceWorkerCoordinator};
pub use error::{ConfigError, HostError, HostResult, RegistrationError, Result};
pub use event::{LifecycleEvent, LifecycleEventKind};
pub use host::{Host, Listener, ScriptProbe, WorkerHandle};
pub use lifecycle::{EventOutcome, UPDATE_PROMPT_MESSAGE, dispatch};
