//! Sites under test.
//!
//! Service workers only register from a secure origin, so the harness
//! serves fixtures over `http://127.0.0.1`, which browsers treat as
//! potentially trustworthy. [`DevServer`] is the seam for pointing the
//! same tests at an already running server instead.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;
use tracing::{debug, warn};

use crate::error::{BrowserError, Result};

/// A running server that pages can be pointed at.
#[async_trait]
pub trait DevServer: Send + Sync {
    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:5173`.
    fn base_url(&self) -> &str;

    /// Called before navigation to fail fast when the server is gone.
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    /// Joins `path` onto the base URL.
    fn url(&self, path: &str) -> String {
        let base = self.base_url().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

impl fmt::Debug for dyn DevServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevServer")
            .field("base_url", &self.base_url())
            .finish()
    }
}

/// A server somebody else started (`vite preview`, a staging host).
#[derive(Debug, Clone)]
pub struct ExternalServer {
    base_url: String,
}

impl ExternalServer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DevServer for ExternalServer {
    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Builder for [`StaticSite`].
#[derive(Debug, Clone)]
pub struct StaticSiteBuilder {
    root: PathBuf,
    mounts: Vec<(String, PathBuf)>,
}

impl StaticSiteBuilder {
    /// Serves `dir` under `route` in addition to the root, e.g. a
    /// `wasm-pack` output directory under `/pkg`.
    #[must_use]
    pub fn mount(mut self, route: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.mounts.push((route.into(), dir.into()));
        self
    }

    /// Binds an ephemeral localhost port and starts serving.
    pub async fn start(self) -> Result<StaticSite> {
        if !self.root.is_dir() {
            return Err(BrowserError::MissingSiteRoot(self.root));
        }

        let mut app = Router::new();
        for (route, dir) in &self.mounts {
            if !dir.is_dir() {
                return Err(BrowserError::MissingSiteRoot(dir.clone()));
            }
            app = app.nest_service(route, ServeDir::new(dir));
        }
        let app = app.fallback_service(ServeDir::new(&self.root));

        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let addr = listener.local_addr()?;
        let (shutdown, signal) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        debug!(%addr, root = %self.root.display(), "static site listening");
        Ok(StaticSite {
            addr,
            base_url: format!("http://{addr}"),
            shutdown: Some(shutdown),
            task,
        })
    }
}

/// A directory served over HTTP on an ephemeral localhost port.
///
/// Stops serving when dropped; [`StaticSite::shutdown`] also surfaces a
/// server error.
pub struct StaticSite {
    addr: SocketAddr,
    base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<std::io::Result<()>>,
}

impl StaticSite {
    pub fn builder(root: impl Into<PathBuf>) -> StaticSiteBuilder {
        StaticSiteBuilder {
            root: root.into(),
            mounts: Vec::new(),
        }
    }

    /// Serves `root` with no extra mounts.
    pub async fn serve(root: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(root).start().await
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops the server and waits for it to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }

        let addr = self.addr;
        match (&mut self.task).await {
            Ok(result) => result.map_err(|e| BrowserError::ServerFailed {
                addr,
                reason: e.to_string(),
            }),
            Err(join) => Err(BrowserError::ServerFailed {
                addr,
                reason: join.to_string(),
            }),
        }
    }
}

impl fmt::Debug for StaticSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSite")
            .field("base_url", &self.base_url)
            .field("running", &!self.task.is_finished())
            .finish()
    }
}

#[async_trait]
impl DevServer for StaticSite {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn health_check(&self) -> Result<()> {
        if self.task.is_finished() {
            return Err(BrowserError::ServerFailed {
                addr: self.addr,
                reason: "server task exited".to_string(),
            });
        }
        Ok(())
    }
}

impl Drop for StaticSite {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            if tx.send(()).is_err() {
                warn!(addr = %self.addr, "static site already stopped");
            }
        }
    }
}
