//! Lifecycle events emitted by a registered worker.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The five lifecycle signals a worker can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEventKind {
    /// The worker finished installing.
    Installed,
    /// The worker took control of the page.
    Controlling,
    /// The worker was activated.
    Activated,
    /// A new worker is installed and waits for the old one to release the page.
    Waiting,
    /// The worker reported an error.
    Error,
}

impl LifecycleEventKind {
    /// Every kind, in the order listeners are attached.
    pub const ALL: [LifecycleEventKind; 5] = [
        LifecycleEventKind::Installed,
        LifecycleEventKind::Controlling,
        LifecycleEventKind::Activated,
        LifecycleEventKind::Waiting,
        LifecycleEventKind::Error,
    ];

    /// Event name as used by the platform.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEventKind::Installed => "installed",
            LifecycleEventKind::Controlling => "controlling",
            LifecycleEventKind::Activated => "activated",
            LifecycleEventKind::Waiting => "waiting",
            LifecycleEventKind::Error => "error",
        }
    }
}

impl fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle signal plus whether it belongs to an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    /// Which transition happened.
    pub kind: LifecycleEventKind,

    /// True when a previously active worker is being replaced.
    pub is_update: bool,

    /// Error detail, only set for `Error` events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LifecycleEvent {
    /// Creates an event without a message.
    #[must_use]
    pub fn new(kind: LifecycleEventKind, is_update: bool) -> Self {
        Self {
            kind,
            is_update,
            message: None,
        }
    }

    /// Creates an `Error` event carrying the platform message.
    pub fn error(message: impl Into<String>, is_update: bool) -> Self {
        Self {
            kind: LifecycleEventKind::Error,
            is_update,
            message: Some(message.into()),
        }
    }
}
