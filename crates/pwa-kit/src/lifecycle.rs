//! Lifecycle event dispatch and the update prompt.

use tracing::{debug, error, info};

use crate::event::{LifecycleEvent, LifecycleEventKind};
use crate::host::Host;

/// Default text of the update confirmation.
pub const UPDATE_PROMPT_MESSAGE: &str = "New app update is available! Click OK to refresh.";

/// What handling an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Only a log line was written.
    Logged,
    /// The user accepted the update and the page was reloaded.
    Reloaded,
    /// The user declined the update; the old worker keeps serving.
    Dismissed,
}

/// Handles one lifecycle event.
///
/// | Event       | first install                | update        |
/// |-------------|------------------------------|---------------|
/// | installed   | log                          | update prompt |
/// | controlling | log                          | log           |
/// | activated   | log                          | log           |
/// | waiting     | update prompt                | update prompt |
/// | error       | error log                    | error log     |
pub fn dispatch(host: &dyn Host, update_message: &str, event: &LifecycleEvent) -> EventOutcome {
    match (event.kind, event.is_update) {
        (LifecycleEventKind::Installed, false) => {
            info!("Service worker installed for the first time");
            EventOutcome::Logged
        }
        (LifecycleEventKind::Installed, true) | (LifecycleEventKind::Waiting, _) => {
            prompt_for_update(host, update_message)
        }
        (LifecycleEventKind::Controlling, _) => {
            info!("Service worker is now controlling the page");
            EventOutcome::Logged
        }
        (LifecycleEventKind::Activated, false) => {
            info!("Service worker activated for the first time");
            EventOutcome::Logged
        }
        (LifecycleEventKind::Activated, true) => {
            info!("Service worker activated after update");
            EventOutcome::Logged
        }
        (LifecycleEventKind::Error, _) => {
            let message = event.message.as_deref().unwrap_or("unknown error");
            error!(is_update = event.is_update, "Service worker error: {message}");
            EventOutcome::Logged
        }
    }
}

/// Asks the user to reload; reloads exactly once when confirmed.
pub fn prompt_for_update(host: &dyn Host, message: &str) -> EventOutcome {
    if host.confirm(message) {
        info!("Reloading to activate the updated service worker");
        host.reload();
        EventOutcome::Reloaded
    } else {
        debug!("Service worker update dismissed");
        EventOutcome::Dismissed
    }
}
