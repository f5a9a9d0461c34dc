//! Error types for service worker coordination.
//!
//! `RegistrationError` is the only error that leaves the coordinator.
//! `HostError` is what the capability surface reports; the coordinator either
//! folds it into a `RegistrationError` or, for the diagnostic queries, reduces
//! it to `false`.

use thiserror::Error;

/// A specialized Result type for registration.
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Result type for capability surface calls.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Why `register()` failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The host environment has no service worker support.
    ///
    /// Not retryable; nothing was requested from the network.
    #[error("Service worker not supported")]
    NotSupported,

    /// The preflight probe got a non-success status for the worker script.
    #[error("Service worker file not found at {url} (status {status})")]
    ScriptNotFound {
        /// Script URL that was probed
        url: String,
        /// HTTP status of the probe
        status: u16,
    },

    /// The preflight probe found the script but it is not served as JavaScript.
    #[error("Service worker has incorrect MIME type: {content_type}")]
    InvalidMimeType {
        /// Script URL that was probed
        url: String,
        /// Content type reported by the server
        content_type: String,
    },

    /// The platform rejected the registration.
    #[error("Service worker registration failed: {cause}")]
    RegistrationFailed {
        /// Platform-provided reason, e.g. "404 Not Found"
        cause: String,
    },
}

impl RegistrationError {
    /// Creates a `RegistrationFailed` error.
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::RegistrationFailed {
            cause: cause.into(),
        }
    }

    /// True for failures that are routine while the worker script is not
    /// deployed, such as a dev server without a built `sw.js`.
    #[must_use]
    pub fn is_missing_script(&self) -> bool {
        matches!(
            self,
            Self::ScriptNotFound { .. } | Self::InvalidMimeType { .. }
        )
    }

    /// Get the error kind as a string (for logging and the JS boundary)
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::NotSupported => "notSupported",
            Self::ScriptNotFound { .. } => "scriptNotFound",
            Self::InvalidMimeType { .. } => "invalidMimeType",
            Self::RegistrationFailed { .. } => "registrationFailed",
        }
    }
}

impl From<HostError> for RegistrationError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Unsupported(_) => Self::NotSupported,
            other => Self::failed(other.to_string()),
        }
    }
}

/// Errors reported by a [`Host`](crate::Host) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// A capability the call needs is missing.
    #[error("capability unavailable: {0}")]
    Unsupported(String),

    /// The platform rejected the operation (JS exception, rejected promise).
    #[error("{0}")]
    Rejected(String),

    /// The platform returned a value of an unexpected shape.
    #[error("unexpected platform value: {0}")]
    Unexpected(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field parsed but failed validation.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue {
        /// Name of the offending field, as spelled in the config file
        field: String,
        reason: String,
    },

    /// A provider (file, environment, defaults) could not be read or merged.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}
