//! Frontend dev-server lifecycle.
//!
//! [`DevServer`] owns at most one live [`DevServerHandle`] and the proxy that
//! targets it. Start and stop are serialized through one lock, so a stop can
//! never race a start that is still building its proxy target. Lifecycle
//! misuse is reported, not ignored: starting twice yields
//! `DevServerAlreadyRunning`, stopping with nothing running yields
//! `DevServerNotRunning`.

mod command;

pub use command::CommandLauncher;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tokio::sync::{Mutex, RwLock};

use crate::error::{FrontendError, Result};
use crate::proxy::ReverseProxy;

/// Token for a running dev-server process.
#[async_trait]
pub trait DevServerHandle: Send + Sync {
    /// Terminates the dev server.
    async fn stop(self: Box<Self>) -> Result<()>;
}

/// What a launcher hands back once the dev server is reachable.
pub struct LaunchedDevServer {
    pub handle: Box<dyn DevServerHandle>,
    /// Base URL the dev server announced, e.g. `http://localhost:5173/`.
    pub base_url: String,
}

/// Trait defining how a dev-server process gets started.
///
/// Dropping the returned future cancels the launch.
#[async_trait]
pub trait DevServerLauncher: Send + Sync {
    async fn start(&self, folder: &Path, command: &str) -> Result<LaunchedDevServer>;
}

/// Lifecycle state for the frontend dev server.
pub struct DevServer {
    launcher: Arc<dyn DevServerLauncher>,
    manifest: String,
    running: Mutex<Option<Box<dyn DevServerHandle>>>,
    proxy: RwLock<Option<Arc<ReverseProxy>>>,
}

impl DevServer {
    /// Creates a stopped dev server. `manifest` is the file that must exist in
    /// the project folder before a start is attempted.
    pub fn new(launcher: Arc<dyn DevServerLauncher>, manifest: impl Into<String>) -> Self {
        Self {
            launcher,
            manifest: manifest.into(),
            running: Mutex::new(None),
            proxy: RwLock::new(None),
        }
    }

    /// Starts the dev server in `folder` and returns its base URL.
    ///
    /// # Errors
    ///
    /// - `ConfigurationMissing` if `folder` lacks the manifest
    /// - `DevServerAlreadyRunning` if a handle is live; the live handle is kept
    /// - whatever the launcher reports
    pub async fn start(&self, folder: &Path, command: &str) -> Result<Url> {
        let manifest = folder.join(&self.manifest);
        if !manifest_exists(&manifest).await {
            return Err(FrontendError::ConfigurationMissing(manifest));
        }

        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(FrontendError::DevServerAlreadyRunning);
        }

        tracing::info!(folder = %folder.display(), command = %command, "Starting frontend dev server");
        let launched = self.launcher.start(folder, command).await?;

        let proxy = match ReverseProxy::for_url(&launched.base_url) {
            Ok(proxy) => proxy,
            Err(e) => {
                if let Err(stop_error) = launched.handle.stop().await {
                    tracing::warn!(error = %stop_error, "Failed to stop dev server after bad URL");
                }
                return Err(e);
            }
        };

        let url = proxy.target().clone();
        *self.proxy.write().await = Some(Arc::new(proxy));
        *running = Some(launched.handle);

        tracing::info!(url = %url, "Frontend dev server ready");
        Ok(url)
    }

    /// Stops the running dev server.
    ///
    /// # Errors
    ///
    /// Returns `DevServerNotRunning` when no handle is live.
    pub async fn stop(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        let handle = running.take().ok_or(FrontendError::DevServerNotRunning)?;
        *self.proxy.write().await = None;

        tracing::info!("Stopping frontend dev server");
        handle.stop().await
    }

    /// Proxy targeting the live dev server, if there is one.
    pub async fn proxy(&self) -> Option<Arc<ReverseProxy>> {
        self.proxy.read().await.clone()
    }

    /// Whether a dev server is live. Reads the proxy slot rather than the
    /// lifecycle lock, so it answers immediately while a start is in flight.
    pub async fn is_running(&self) -> bool {
        self.proxy.read().await.is_some()
    }
}

async fn manifest_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
