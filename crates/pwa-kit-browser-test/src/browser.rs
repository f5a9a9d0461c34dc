//! Chrome process lifecycle.
//!
//! `TestBrowser` relies on chromiumoxide's own `Drop` to kill the process if
//! a test panics before [`TestBrowser::close`] runs.

use std::sync::Arc;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{BrowserError, Result};
use crate::page::Page;

/// Launch options for [`TestBrowser`].
#[derive(Debug, Clone)]
pub struct TestBrowserConfig {
    /// Run without a window (default: true unless the `visible` feature is on).
    pub headless: bool,

    pub window_size: (u32, u32),

    /// Extra Chrome flags.
    pub args: Vec<String>,

    /// Chrome executable; auto-detected when `None`.
    pub chrome_path: Option<String>,
}

impl TestBrowserConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visible(mut self) -> Self {
        self.headless = false;
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    #[must_use]
    pub fn with_chrome_path(mut self, path: impl Into<String>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    fn to_browser_config(&self) -> Result<BrowserConfig> {
        let mut config = BrowserConfig::builder().window_size(self.window_size.0, self.window_size.1);

        if !self.headless {
            config = config.with_head();
        }

        // A fresh profile per launch: no service workers left over from a
        // previous run, and no ProcessSingleton clash between parallel tests.
        let profile = std::env::temp_dir().join(format!("pwa-kit-browser-test-{}", uuid::Uuid::new_v4()));
        config = config.user_data_dir(profile);

        for arg in &self.args {
            config = config.arg(arg.clone());
        }

        if let Some(path) = &self.chrome_path {
            config = config.chrome_executable(path.clone());
        }

        config.build().map_err(|reason| BrowserError::LaunchFailed {
            reason: format!("invalid browser configuration: {reason}"),
            source: None,
        })
    }
}

impl Default for TestBrowserConfig {
    fn default() -> Self {
        Self {
            headless: !cfg!(feature = "visible"),
            window_size: (1280, 800),
            args: vec![
                // Containers usually lack user namespaces for the sandbox
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            chrome_path: None,
        }
    }
}

/// A running Chrome instance.
pub struct TestBrowser {
    inner: Arc<Mutex<Option<Browser>>>,
}

impl TestBrowser {
    /// Starts Chrome and drives its CDP handler on a background task.
    pub async fn launch(config: TestBrowserConfig) -> Result<Self> {
        debug!(?config, "launching browser");

        let (browser, mut handler) = Browser::launch(config.to_browser_config()?)
            .await
            .map_err(|e| BrowserError::LaunchFailed {
                reason: "failed to launch Chrome process".to_string(),
                source: Some(Box::new(e)),
            })?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("browser handler error: {e}");
                }
            }
        });

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(browser))),
        })
    }

    /// Opens a blank tab with console and exception capture running.
    pub async fn new_page(&self) -> Result<Page> {
        let browser = self.inner.lock().await;
        let browser = browser.as_ref().ok_or(BrowserError::AlreadyClosed)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        Ok(Page::new(page))
    }

    /// Closes Chrome gracefully.
    pub async fn close(self) -> Result<()> {
        if let Some(mut browser) = self.inner.lock().await.take() {
            browser
                .close()
                .await
                .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;
            if let Err(e) = browser.wait().await {
                debug!("browser process did not exit cleanly: {e}");
            }
        }

        Ok(())
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}
