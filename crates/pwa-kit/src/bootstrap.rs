//! Application startup policy.
//!
//! The coordinator reports registration failures; this module decides they
//! are never fatal. A missing or mis-served worker script is routine on a dev
//! server, so it is logged at info. Anything else is a warning.

use tracing::{info, warn};

use crate::coordinator::ServiceWorkerCoordinator;
use crate::error::RegistrationError;

/// What startup found out about offline support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// The worker registered successfully.
    pub registered: bool,
    /// The app runs in standalone display mode.
    pub installed: bool,
    /// Why registration failed, if it did.
    pub error: Option<RegistrationError>,
}

/// Registers the worker without ever failing the caller.
pub async fn start(coordinator: &ServiceWorkerCoordinator) -> StartupReport {
    let result = coordinator.register().await;

    if let Err(err) = &result {
        match err {
            e if e.is_missing_script() => info!(
                "PWA service worker not available during development. This is expected and will work in production."
            ),
            RegistrationError::NotSupported => {
                info!("Continuing without offline support: service workers are unavailable")
            }
            other => warn!("PWA initialization failed: {other}"),
        }
    }

    StartupReport {
        registered: result.is_ok(),
        installed: coordinator.is_installed(),
        error: result.err(),
    }
}
