//! # pwa-kit-web
//!
//! WebAssembly bindings for pwa-kit - register a service worker and handle
//! its updates from the page.
//!
//! ## Usage
//!
//! ```javascript
//! import init, { PwaService } from './pkg/pwa_kit_web.js';
//!
//! await init();
//!
//! const pwa = new PwaService({ url: './sw.js', scope: './' });
//! const report = await pwa.start();
//! if (report.error) {
//!   console.debug('offline support unavailable:', report.error.kind);
//! }
//!
//! if (pwa.isInstalled()) {
//!   document.body.classList.add('standalone');
//! }
//! ```

mod error;
mod host;
mod logging;

use std::rc::Rc;

use js_sys::Promise;
use pwa_kit::logging::LogLevel;
use pwa_kit::{PreflightPolicy, PwaConfig, ServiceWorkerCoordinator, StartupReport};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

pub use error::WasmError;
pub use host::{WebHost, WebWorker};
pub use logging::{ConsoleMakeWriter, ConsoleWriter, init_console_logging};

/// Installs the panic hook and console logging when the module loads.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    init_console_logging(LogLevel::Info);
}

/// Options object accepted by the `PwaService` constructor.
///
/// Every field is optional; missing ones take the [`PwaConfig`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WasmPwaOptions {
    pub url: Option<String>,
    pub scope: Option<String>,
    pub preflight: Option<PreflightPolicy>,
    pub update_message: Option<String>,
}

impl From<WasmPwaOptions> for PwaConfig {
    fn from(opts: WasmPwaOptions) -> Self {
        let defaults = PwaConfig::default();
        PwaConfig {
            url: opts.url.unwrap_or(defaults.url),
            scope: opts.scope.unwrap_or(defaults.scope),
            preflight: opts.preflight.unwrap_or(defaults.preflight),
            update_message: opts.update_message.unwrap_or(defaults.update_message),
        }
    }
}

impl WasmPwaOptions {
    /// Reads an options object; `undefined` and `null` mean defaults.
    pub fn from_js(value: JsValue) -> Result<Self, WasmError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }

        serde_wasm_bindgen::from_value(value).map_err(|err| WasmError::InvalidConfig {
            message: format!("invalid PwaService options: {err}"),
            field: None,
        })
    }
}

/// Result of `PwaService.start()` (serializable for JS)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasmStartupReport {
    pub registered: bool,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WasmError>,
}

impl From<StartupReport> for WasmStartupReport {
    fn from(report: StartupReport) -> Self {
        Self {
            registered: report.registered,
            installed: report.installed,
            error: report.error.map(WasmError::from),
        }
    }
}

/// Service worker coordinator for the current page.
#[wasm_bindgen]
pub struct PwaService {
    coordinator: Rc<ServiceWorkerCoordinator>,
}

#[wasm_bindgen]
impl PwaService {
    /// Create a service for `options` (`{ url, scope, preflight, updateMessage }`).
    ///
    /// Throws a `kind: "invalidConfig"` object for malformed or empty values.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<PwaService, JsValue> {
        let config = PwaConfig::from(WasmPwaOptions::from_js(options)?);
        config.validate().map_err(WasmError::from)?;

        let host = WebHost::new().map_err(WasmError::from)?;
        Ok(Self {
            coordinator: Rc::new(ServiceWorkerCoordinator::new(Rc::new(host), config)),
        })
    }

    /// Register the worker. Rejects with a tagged error object.
    pub fn register(&self) -> Promise {
        let coordinator = Rc::clone(&self.coordinator);
        future_to_promise(async move {
            coordinator
                .register()
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|err| WasmError::from(err).into())
        })
    }

    /// Whether the page runs as an installed app.
    #[wasm_bindgen(js_name = isInstalled)]
    pub fn is_installed(&self) -> bool {
        self.coordinator.is_installed()
    }

    /// Resolves to whether a registration exists for the configured scope.
    #[wasm_bindgen(js_name = isRegistered)]
    pub fn is_registered(&self) -> Promise {
        let coordinator = Rc::clone(&self.coordinator);
        future_to_promise(async move {
            Ok(JsValue::from_bool(coordinator.is_registered().await))
        })
    }

    /// Register without ever rejecting; resolves to
    /// `{ registered, installed, error? }`.
    pub fn start(&self) -> Promise {
        let coordinator = Rc::clone(&self.coordinator);
        future_to_promise(async move {
            let report = WasmStartupReport::from(pwa_kit::start(&coordinator).await);
            serde_wasm_bindgen::to_value(&report)
                .map_err(|err| JsValue::from_str(&format!("Serialization error: {err}")))
        })
    }

    /// Configured worker script URL
    #[wasm_bindgen(getter)]
    pub fn url(&self) -> String {
        self.coordinator.config().url.clone()
    }

    /// Configured scope
    #[wasm_bindgen(getter)]
    pub fn scope(&self) -> String {
        self.coordinator.config().scope.clone()
    }
}
