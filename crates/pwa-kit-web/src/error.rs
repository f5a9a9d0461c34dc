//! Error objects handed to JavaScript.
//!
//! Errors cross the WASM boundary as plain objects tagged with `kind`, so
//! callers can branch without string matching:
//!
//! ```javascript
//! try {
//!   await pwa.register();
//! } catch (error) {
//!   if (error.kind === 'scriptNotFound' || error.kind === 'invalidMimeType') {
//!     // dev server without a built sw.js
//!   }
//! }
//! ```

use pwa_kit::{ConfigError, HostError, RegistrationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WasmError {
    /// No `navigator.serviceWorker` (insecure context or old browser)
    #[error("{message}")]
    NotSupported { message: String },

    /// Preflight probe got a non-success status
    #[serde(rename_all = "camelCase")]
    #[error("{message}")]
    ScriptNotFound {
        message: String,
        url: String,
        status: u16,
    },

    /// Preflight probe found a non-JavaScript content type
    #[serde(rename_all = "camelCase")]
    #[error("{message}")]
    InvalidMimeType {
        message: String,
        url: String,
        content_type: String,
    },

    /// The browser rejected `serviceWorker.register`
    #[error("{message}")]
    RegistrationFailed { message: String, cause: String },

    /// Options failed validation
    #[error("{message}")]
    InvalidConfig {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },
}

impl WasmError {
    /// Get the error kind as a string (for logging/debugging)
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::NotSupported { .. } => "notSupported",
            Self::ScriptNotFound { .. } => "scriptNotFound",
            Self::InvalidMimeType { .. } => "invalidMimeType",
            Self::RegistrationFailed { .. } => "registrationFailed",
            Self::InvalidConfig { .. } => "invalidConfig",
        }
    }

    /// Get the primary error message
    pub fn message(&self) -> &str {
        match self {
            Self::NotSupported { message }
            | Self::ScriptNotFound { message, .. }
            | Self::InvalidMimeType { message, .. }
            | Self::RegistrationFailed { message, .. }
            | Self::InvalidConfig { message, .. } => message,
        }
    }
}

impl From<RegistrationError> for WasmError {
    fn from(err: RegistrationError) -> Self {
        let message = err.to_string();
        match err {
            RegistrationError::NotSupported => Self::NotSupported { message },
            RegistrationError::ScriptNotFound { url, status } => Self::ScriptNotFound {
                message,
                url,
                status,
            },
            RegistrationError::InvalidMimeType { url, content_type } => Self::InvalidMimeType {
                message,
                url,
                content_type,
            },
            RegistrationError::RegistrationFailed { cause } => {
                Self::RegistrationFailed { message, cause }
            }
        }
    }
}

impl From<ConfigError> for WasmError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        let field = match err {
            ConfigError::InvalidValue { field, .. } => Some(field),
            ConfigError::Load(_) => None,
        };
        Self::InvalidConfig { message, field }
    }
}

impl From<HostError> for WasmError {
    fn from(err: HostError) -> Self {
        RegistrationError::from(err).into()
    }
}

// Convert WasmError to JsValue for WASM boundary crossing
impl From<WasmError> for JsValue {
    fn from(err: WasmError) -> Self {
        match serde_wasm_bindgen::to_value(&err) {
            Ok(js_value) => js_value,
            Err(serialization_err) => JsValue::from_str(&format!(
                "Error serialization failed: {} (original error: {})",
                serialization_err, err
            )),
        }
    }
}

/// Describes a thrown JS value, preferring `Error.name: Error.message`.
pub(crate) fn describe_js_error(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return format!(
            "{}: {}",
            String::from(err.name()),
            String::from(err.message())
        );
    }

    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Wraps a thrown JS value as a host rejection.
pub(crate) fn js_error(value: JsValue) -> HostError {
    HostError::Rejected(describe_js_error(&value))
}
