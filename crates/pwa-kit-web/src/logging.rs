//! `tracing` output routed to the browser console.
//!
//! Each formatted line goes to the `console` method matching its level, so
//! devtools filtering by severity keeps working.

use std::io;

use pwa_kit::logging::LogLevel;
use tracing::{Level, Metadata, debug};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wasm_bindgen::JsValue;
use web_sys::console;

/// Hands out one [`ConsoleWriter`] per log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

/// Buffers one formatted line and flushes it to `console` on drop.
#[derive(Debug)]
pub struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter {
            level: Level::INFO,
            buffer: Vec::new(),
        }
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter {
            level: *meta.level(),
            buffer: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let line = String::from_utf8_lossy(&self.buffer);
        let line = JsValue::from_str(line.trim_end());
        match self.level {
            Level::ERROR => console::error_1(&line),
            Level::WARN => console::warn_1(&line),
            Level::INFO => console::info_1(&line),
            _ => console::debug_1(&line),
        }
    }
}

/// Installs a console subscriber at `level`.
///
/// A subscriber installed earlier (by the host page or a previous call)
/// stays in place. Returns whether this call installed one.
pub fn init_console_logging(level: LogLevel) -> bool {
    let installed = tracing_subscriber::registry()
        .with(level.level_filter())
        .with(
            fmt::layer()
                .without_time()
                .with_ansi(false)
                .with_target(false)
                .with_writer(ConsoleMakeWriter),
        )
        .try_init();

    match installed {
        Ok(()) => true,
        Err(err) => {
            debug!("Keeping existing tracing subscriber: {err}");
            false
        }
    }
}
