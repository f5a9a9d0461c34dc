//! Service worker registration and update coordination.
//!
//! `ServiceWorkerCoordinator` owns at most one [`RegistrationHandle`]. It
//! attaches all lifecycle listeners before asking the platform to register,
//! so no event can fire without a listener in place.
//!
//! `register()` is the only fallible operation. `is_installed()` and
//! `is_registered()` are diagnostics and always produce a boolean.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, info};

use crate::config::{PreflightPolicy, PwaConfig};
use crate::error::{RegistrationError, Result};
use crate::event::{LifecycleEvent, LifecycleEventKind};
use crate::host::{Host, WorkerHandle};
use crate::lifecycle::dispatch;

/// Handle to a successfully registered worker.
#[derive(Clone)]
pub struct RegistrationHandle {
    worker: Rc<dyn WorkerHandle>,
    url: String,
    scope: String,
}

impl RegistrationHandle {
    /// Script URL the worker was registered from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Scope the worker controls.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl fmt::Debug for RegistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationHandle")
            .field("url", &self.url)
            .field("scope", &self.scope)
            .field("worker", &self.worker)
            .finish()
    }
}

/// Registers the app's service worker and reacts to its lifecycle.
#[derive(Debug)]
pub struct ServiceWorkerCoordinator {
    host: Rc<dyn Host>,
    config: PwaConfig,
    registration: RefCell<Option<RegistrationHandle>>,
}

impl ServiceWorkerCoordinator {
    /// Creates a coordinator. Nothing is registered until [`register`](Self::register).
    pub fn new(host: Rc<dyn Host>, config: PwaConfig) -> Self {
        Self {
            host,
            config,
            registration: RefCell::new(None),
        }
    }

    /// The configuration supplied at construction.
    #[must_use]
    pub fn config(&self) -> &PwaConfig {
        &self.config
    }

    /// The active registration, if `register()` has succeeded.
    #[must_use]
    pub fn registration(&self) -> Option<RegistrationHandle> {
        self.registration.borrow().clone()
    }

    /// Registers the service worker.
    ///
    /// Succeeds once the platform confirms the registration. A successful call
    /// replaces any previous handle.
    ///
    /// # Errors
    ///
    /// - `NotSupported` when the host has no service worker capability; no
    ///   request is made.
    /// - `ScriptNotFound` / `InvalidMimeType` when the preflight policy is
    ///   `Validate` and the probe fails.
    /// - `RegistrationFailed` when the platform rejects the registration.
    ///
    /// Failures are logged here and still returned; whether a missing worker
    /// is fatal is the caller's decision.
    pub async fn register(&self) -> Result<()> {
        if !self.host.supports_service_worker() {
            info!("Service worker not supported by this browser");
            return Err(RegistrationError::NotSupported);
        }

        match self.try_register().await {
            Ok(handle) => {
                info!(
                    url = %handle.url,
                    scope = %handle.scope,
                    "Service worker registered successfully"
                );
                *self.registration.borrow_mut() = Some(handle);
                Ok(())
            }
            Err(err) => {
                error!(kind = err.kind_str(), "{err}");
                Err(err)
            }
        }
    }

    async fn try_register(&self) -> Result<RegistrationHandle> {
        if self.config.preflight == PreflightPolicy::Validate {
            self.preflight().await?;
        }

        let worker = self
            .host
            .create_worker(&self.config.url, &self.config.scope)?;

        self.attach_listeners(worker.as_ref());

        worker.register().await?;

        Ok(RegistrationHandle {
            worker,
            url: self.config.url.clone(),
            scope: self.config.scope.clone(),
        })
    }

    async fn preflight(&self) -> Result<()> {
        let url = &self.config.url;
        debug!("Probing service worker script at {url}");

        let probe = self.host.probe_script(url).await?;

        if !probe.is_success() {
            return Err(RegistrationError::ScriptNotFound {
                url: url.clone(),
                status: probe.status,
            });
        }

        // A missing header is accepted; only an explicit non-JS type is rejected.
        if let Some(content_type) = probe.content_type {
            if !content_type.contains("javascript") {
                return Err(RegistrationError::InvalidMimeType {
                    url: url.clone(),
                    content_type,
                });
            }
        }

        Ok(())
    }

    fn attach_listeners(&self, worker: &dyn WorkerHandle) {
        for kind in LifecycleEventKind::ALL {
            let host = Rc::clone(&self.host);
            let message = self.config.update_message.clone();
            worker.add_listener(
                kind,
                Rc::new(move |event: &LifecycleEvent| {
                    dispatch(host.as_ref(), &message, event);
                }),
            );
        }
    }

    /// Whether the app runs as an installed, standalone app.
    ///
    /// Each signal is consulted on its own; a signal whose detection fails
    /// counts as "not standalone".
    #[must_use]
    pub fn is_installed(&self) -> bool {
        let display_mode = self.host.display_mode_standalone().unwrap_or_else(|err| {
            debug!("Display mode detection failed: {err}");
            false
        });

        display_mode
            || self.host.navigator_standalone().unwrap_or_else(|err| {
                debug!("iOS standalone detection failed: {err}");
                false
            })
    }

    /// Whether a registration exists for the configured scope.
    ///
    /// Resolves `false` when unsupported, when nothing is registered, and when
    /// the lookup itself fails.
    pub async fn is_registered(&self) -> bool {
        if !self.host.supports_service_worker() {
            return false;
        }

        self.host
            .has_registration(&self.config.scope)
            .await
            .unwrap_or_else(|err| {
                debug!("Registration lookup failed: {err}");
                false
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::ScriptProbe;
    use crate::test_utils::{FakeHost, HostCall};

    fn coordinator(host: &Rc<FakeHost>, config: PwaConfig) -> ServiceWorkerCoordinator {
        ServiceWorkerCoordinator::new(host.clone(), config)
    }

    #[tokio::test]
    async fn registration_handle_stored_on_success() {
        let host = Rc::new(FakeHost::new());
        let sw = coordinator(&host, PwaConfig::default());
        assert!(sw.registration().is_none());

        sw.register().await.unwrap();

        let handle = sw.registration().expect("handle after success");
        assert_eq!(handle.url(), "./sw.js");
        assert_eq!(handle.scope(), "./");
    }

    #[tokio::test]
    async fn failed_registration_leaves_no_handle() {
        let host = Rc::new(FakeHost::new().rejecting_registration("network error"));
        let sw = coordinator(&host, PwaConfig::default());

        assert!(sw.register().await.is_err());
        assert!(sw.registration().is_none());
    }

    #[tokio::test]
    async fn reregistration_replaces_handle() {
        let host = Rc::new(FakeHost::new());
        let sw = coordinator(&host, PwaConfig::default());

        sw.register().await.unwrap();
        sw.register().await.unwrap();

        assert_eq!(host.count(|c| matches!(c, HostCall::Register)), 2);
        assert!(sw.registration().is_some());
    }

    #[tokio::test]
    async fn preflight_accepts_missing_content_type() {
        let host = Rc::new(FakeHost::new().with_probe(Ok(ScriptProbe::new(200, None))));
        let sw = coordinator(
            &host,
            PwaConfig::default().with_preflight(PreflightPolicy::Validate),
        );

        sw.register().await.unwrap();
        assert_eq!(host.calls()[0], HostCall::Probe("./sw.js".to_string()));
    }

    #[tokio::test]
    async fn preflight_transport_error_is_registration_failure() {
        let host = Rc::new(
            FakeHost::new().with_probe(Err(HostError::Rejected("Failed to fetch".into()))),
        );
        let sw = coordinator(
            &host,
            PwaConfig::default().with_preflight(PreflightPolicy::Validate),
        );

        assert_eq!(
            sw.register().await,
            Err(RegistrationError::failed("Failed to fetch"))
        );
        assert_eq!(host.count(|c| matches!(c, HostCall::Register)), 0);
    }

    #[tokio::test]
    async fn listeners_use_configured_update_message() {
        let host = Rc::new(FakeHost::new());
        let sw = coordinator(&host, PwaConfig::default().with_update_message("Refresh now?"));
        sw.register().await.unwrap();

        host.emit(LifecycleEvent::new(LifecycleEventKind::Waiting, false));

        assert!(host.calls().contains(&HostCall::Confirm("Refresh now?".to_string())));
    }

    #[test]
    fn ios_flag_not_consulted_when_display_mode_matches() {
        let host = Rc::new(
            FakeHost::new()
                .with_display_mode(Ok(true))
                .with_ios_standalone(Err(HostError::Unexpected("standalone".into()))),
        );
        let sw = coordinator(&host, PwaConfig::default());

        assert!(sw.is_installed());
    }
}
