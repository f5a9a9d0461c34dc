//! Error types for harness operations.
//!
//! Browser, page and server failures are kept apart so a test report says
//! which side of the harness broke.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong while driving the browser or the site.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Chrome could not be started (not installed, bad flags, no permission).
    #[error("failed to launch browser: {reason}")]
    LaunchFailed {
        /// What the launcher reported
        reason: String,
        /// Underlying launcher error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tab could not be opened or the CDP connection dropped.
    #[error("CDP connection failed: {0}")]
    ConnectionFailed(String),

    /// The page did not load.
    #[error("navigation to '{url}' failed: {reason}")]
    NavigationFailed {
        /// Requested URL
        url: String,
        /// What chromiumoxide reported
        reason: String,
    },

    /// A polled condition stayed false.
    #[error("wait condition '{condition}' timed out after {timeout:?}")]
    WaitTimeout {
        /// Human-readable condition
        condition: String,
        /// How long we polled
        timeout: Duration,
    },

    /// Evaluating a script threw or returned something unexpected.
    #[error("JavaScript execution failed: {0}")]
    ScriptExecutionFailed(String),

    /// The static site root does not exist.
    #[error("site root '{}' is not a directory", .0.display())]
    MissingSiteRoot(PathBuf),

    /// The static site server stopped with an error.
    #[error("static site server on {addr} failed: {reason}")]
    ServerFailed {
        /// Bound address
        addr: SocketAddr,
        /// What axum reported
        reason: String,
    },

    /// An operation was attempted on a closed browser instance.
    #[error("browser instance is already closed")]
    AlreadyClosed,

    /// Wraps errors from the chromiumoxide library.
    #[error("chromiumoxide error: {0}")]
    ChromiumOxide(#[from] chromiumoxide::error::CdpError),

    /// Socket and filesystem errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for harness operations.
pub type Result<T> = std::result::Result<T, BrowserError>;
