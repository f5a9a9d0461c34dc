//! Console capture.
//!
//! A page's `console.*` calls arrive as CDP `Runtime.consoleAPICalled`
//! events on a background task; tests read them back from a shared buffer
//! in arrival order.

use std::sync::{Arc, Mutex, PoisonError};

use chromiumoxide::cdp::js_protocol::runtime::{ConsoleApiCalledType, EventConsoleApiCalled};
use serde::{Deserialize, Serialize};

/// Console method that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleLevel {
    Log,
    Info,
    Warning,
    Error,
    Debug,
    Other,
}

impl ConsoleLevel {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ConsoleLevel::Error)
    }

    #[must_use]
    pub fn is_warning_or_error(&self) -> bool {
        matches!(self, ConsoleLevel::Warning | ConsoleLevel::Error)
    }
}

impl From<&ConsoleApiCalledType> for ConsoleLevel {
    fn from(kind: &ConsoleApiCalledType) -> Self {
        match kind {
            ConsoleApiCalledType::Log => ConsoleLevel::Log,
            ConsoleApiCalledType::Info => ConsoleLevel::Info,
            ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
            ConsoleApiCalledType::Error => ConsoleLevel::Error,
            ConsoleApiCalledType::Debug => ConsoleLevel::Debug,
            _ => ConsoleLevel::Other,
        }
    }
}

/// One captured console call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    /// String arguments joined with spaces; objects render as `<object>`.
    pub text: String,
    /// `url:line:column` of the calling frame, when CDP reports one.
    pub source: Option<String>,
}

impl ConsoleMessage {
    #[must_use]
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            source: None,
        }
    }

    /// Whether the text mentions service workers in either spelling.
    #[must_use]
    pub fn mentions_service_worker(&self) -> bool {
        let text = self.text.to_lowercase();
        text.contains("service worker") || text.contains("serviceworker")
    }
}

/// Shared, cloneable message buffer.
#[derive(Debug, Clone, Default)]
pub struct ConsoleCapture {
    messages: Arc<Mutex<Vec<ConsoleMessage>>>,
}

impl ConsoleCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, message: ConsoleMessage) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Snapshot of everything captured so far.
    #[must_use]
    pub fn messages(&self) -> Vec<ConsoleMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn filtered(&self, keep: impl Fn(&ConsoleMessage) -> bool) -> Vec<ConsoleMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|m| keep(m))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<ConsoleMessage> {
        self.filtered(|m| m.level.is_error())
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<ConsoleMessage> {
        self.filtered(|m| m.level == ConsoleLevel::Warning)
    }

    /// Messages whose text contains `needle`.
    #[must_use]
    pub fn containing(&self, needle: &str) -> Vec<ConsoleMessage> {
        self.filtered(|m| m.text.contains(needle))
    }

    /// Warnings and errors that mention service workers.
    #[must_use]
    pub fn service_worker_problems(&self) -> Vec<ConsoleMessage> {
        self.filtered(|m| m.level.is_warning_or_error() && m.mentions_service_worker())
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors().len()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Drops captured messages, e.g. between two navigations of one page.
    pub fn clear(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn parse_console_event(event: &EventConsoleApiCalled) -> ConsoleMessage {
    let text = event
        .args
        .iter()
        .map(|arg| {
            arg.value
                .as_ref()
                .and_then(|v| v.as_str())
                .unwrap_or("<object>")
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut message = ConsoleMessage::new(ConsoleLevel::from(&event.r#type), text);
    if let Some(frame) = event
        .stack_trace
        .as_ref()
        .and_then(|trace| trace.call_frames.first())
    {
        message.source = Some(format!(
            "{}:{}:{}",
            frame.url, frame.line_number, frame.column_number
        ));
    }

    message
}
