//! Polling helpers.
//!
//! Service worker state changes land asynchronously, so assertions poll a
//! condition until it holds or the deadline passes.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::sleep;

use crate::error::{BrowserError, Result};

/// Default timeout for wait operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Timeout and poll interval for a wait.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Custom timeout, default poll interval.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Polls `condition` until it yields `Some`, returning the value.
///
/// Errors from the condition count as "not yet": a page mid-navigation
/// rejects evaluations for a moment.
pub async fn wait_for<T, F, Fut>(condition: F, config: WaitConfig, description: &str) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start = Instant::now();

    loop {
        if let Ok(Some(value)) = condition().await {
            return Ok(value);
        }

        if start.elapsed() >= config.timeout {
            return Err(BrowserError::WaitTimeout {
                condition: description.to_string(),
                timeout: config.timeout,
            });
        }

        sleep(config.poll_interval).await;
    }
}

/// Polls a boolean condition until it is true.
pub async fn wait_until<F, Fut>(condition: F, config: WaitConfig, description: &str) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    wait_for(
        || {
            let check = condition();
            async move { check.await.map(|done| done.then_some(())) }
        },
        config,
        description,
    )
    .await
}
