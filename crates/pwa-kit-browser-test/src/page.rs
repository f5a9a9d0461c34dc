//! A browser tab, with service worker and display-mode probes.

use std::sync::{Arc, Mutex, PoisonError};

use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use chromiumoxide::page::Page as ChromePage;
use futures::StreamExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::console::{ConsoleCapture, parse_console_event};
use crate::error::{BrowserError, Result};
use crate::server::DevServer;
use crate::wait::{WaitConfig, wait_for, wait_until};

const REGISTRATION_SCRIPT: &str = r"(async () => {
    if (!('serviceWorker' in navigator)) return null;
    const registration = await navigator.serviceWorker.getRegistration();
    if (!registration) return null;
    const worker = registration.active || registration.waiting || registration.installing;
    return {
        scope: registration.scope,
        state: worker ? worker.state : null,
        scriptUrl: worker ? worker.scriptURL : null,
    };
})()";

const UNREGISTER_SCRIPT: &str = r"(async () => {
    if (!('serviceWorker' in navigator)) return 0;
    const registrations = await navigator.serviceWorker.getRegistrations();
    const results = await Promise.all(registrations.map((r) => r.unregister()));
    return results.filter(Boolean).length;
})()";

/// What `navigator.serviceWorker.getRegistration()` reports for the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInfo {
    pub scope: String,
    /// State of the newest worker (`installing`, `installed`, `activated`, ...)
    pub state: Option<String>,
    pub script_url: Option<String>,
}

impl RegistrationInfo {
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.state.as_deref() == Some("activated")
    }
}

/// A tab with console and uncaught-exception capture.
#[derive(Debug)]
pub struct Page {
    inner: Arc<ChromePage>,
    console: ConsoleCapture,
    exceptions: Arc<Mutex<Vec<String>>>,
    listeners: Vec<JoinHandle<()>>,
}

impl Page {
    pub(crate) fn new(page: ChromePage) -> Self {
        let inner = Arc::new(page);
        let console = ConsoleCapture::new();
        let exceptions = Arc::new(Mutex::new(Vec::new()));

        let page = inner.clone();
        let sink = console.clone();
        let console_task = tokio::spawn(async move {
            if let Ok(mut events) = page.event_listener::<EventConsoleApiCalled>().await {
                while let Some(event) = events.next().await {
                    sink.push(parse_console_event(&event));
                }
            }
        });

        // Uncaught errors and unhandled rejections both arrive here.
        let page = inner.clone();
        let sink = exceptions.clone();
        let exception_task = tokio::spawn(async move {
            if let Ok(mut events) = page.event_listener::<EventExceptionThrown>().await {
                while let Some(event) = events.next().await {
                    let details = &event.exception_details;
                    let description = details
                        .exception
                        .as_ref()
                        .and_then(|e| e.description.clone())
                        .unwrap_or_default();
                    sink.lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(format!("{} {}", details.text, description).trim().to_string());
                }
            }
        });

        Self {
            inner,
            console,
            exceptions,
            listeners: vec![console_task, exception_task],
        }
    }

    #[must_use]
    pub fn console(&self) -> &ConsoleCapture {
        &self.console
    }

    /// Uncaught exceptions and unhandled promise rejections seen so far.
    #[must_use]
    pub fn exceptions(&self) -> Vec<String> {
        self.exceptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Navigates to an absolute URL and waits for `readyState == "complete"`.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        self.wait_for_load(WaitConfig::default()).await
    }

    /// Navigates to a path on `server` after a health check.
    pub async fn navigate_to(&self, server: &dyn DevServer, path: &str) -> Result<()> {
        server.health_check().await?;
        self.navigate(&server.url(path)).await
    }

    pub async fn wait_for_load(&self, config: WaitConfig) -> Result<()> {
        wait_until(
            || async {
                let state: String = self.evaluate("document.readyState").await?;
                Ok(state == "complete")
            },
            config,
            "document ready",
        )
        .await
    }

    /// Evaluates an expression, awaiting it if it is a promise.
    ///
    /// CDP omits the value for `null` and `undefined`; both deserialize as
    /// JSON `null`, so `Option<T>` targets see `None`.
    pub async fn evaluate<T>(&self, script: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let result = self
            .inner
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::ScriptExecutionFailed(e.to_string()))?;

        let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value).map_err(|e| BrowserError::ScriptExecutionFailed(e.to_string()))
    }

    /// Whether `navigator.serviceWorker` exists on this origin.
    pub async fn service_worker_supported(&self) -> Result<bool> {
        self.evaluate("'serviceWorker' in navigator").await
    }

    /// The page's current registration, if any.
    pub async fn service_worker_registration(&self) -> Result<Option<RegistrationInfo>> {
        self.evaluate(REGISTRATION_SCRIPT).await
    }

    /// Waits until the page has a registration whose worker is activated.
    pub async fn wait_for_service_worker(&self, config: WaitConfig) -> Result<RegistrationInfo> {
        wait_for(
            || async {
                let registration = self.service_worker_registration().await?;
                Ok(registration.filter(RegistrationInfo::is_activated))
            },
            config,
            "activated service worker",
        )
        .await
    }

    /// Whether an active worker controls this page.
    pub async fn is_controlled(&self) -> Result<bool> {
        self.evaluate("!!(navigator.serviceWorker && navigator.serviceWorker.controller)")
            .await
    }

    /// Whether `(display-mode: standalone)` matches.
    pub async fn display_mode_standalone(&self) -> Result<bool> {
        self.evaluate("window.matchMedia('(display-mode: standalone)').matches")
            .await
    }

    /// Unregisters every worker for the origin; returns how many went away.
    pub async fn unregister_service_workers(&self) -> Result<usize> {
        let count = self.evaluate(UNREGISTER_SCRIPT).await?;
        debug!(count, "unregistered service workers");
        Ok(count)
    }

    pub async fn title(&self) -> Result<String> {
        self.evaluate("document.title").await
    }

    /// PNG screenshot, for attaching to a failing CI run.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.inner
            .screenshot(chromiumoxide::page::ScreenshotParams::default())
            .await
            .map_err(BrowserError::ChromiumOxide)
    }

    /// Stops the capture tasks and closes the tab.
    pub async fn close(mut self) -> Result<()> {
        for task in self.listeners.drain(..) {
            task.abort();
            let _ = task.await;
        }

        match Arc::try_unwrap(self.inner) {
            Ok(page) => page.close().await.map_err(BrowserError::ChromiumOxide),
            // Still shared; the browser closes it on shutdown.
            Err(_) => Ok(()),
        }
    }
}
