//! Mode routing and the externally exposed request handler.
//!
//! A [`Frontend`] captures its options at construction. Mode, framework and
//! the mounted root never change afterwards, so concurrent requests read them
//! without locking. Only the dev-server handle is mutable, and it lives behind
//! [`DevServer`]'s lock.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use reqwest::Url;

use crate::devserver::{CommandLauncher, DevServer, DevServerLauncher};
use crate::error::{FrontendError, Result};
use crate::interceptor::FallbackInterceptor;
use crate::options::{FrontendOptions, OperatingMode};
use crate::proxy::{Forward, ReverseProxy};
use crate::resolver::StaticResolver;
use crate::store::{AssetStore, ResolvedRoot};

const UNAVAILABLE_MESSAGE: &str =
    "Frontend dev server is not running. Start it, or configure a fixed dev port.";

/// Serves a frontend in development or release mode.
pub struct Frontend {
    options: FrontendOptions,
    resolver: StaticResolver,
    dev_server: DevServer,
    fixed_proxy: Option<Arc<dyn Forward>>,
}

impl Frontend {
    /// Creates a frontend, resolving a relative project folder against the
    /// current directory.
    pub fn new(options: FrontendOptions, store: Arc<dyn AssetStore>) -> Result<Self> {
        Self::with_base(options, store, Path::new("."))
    }

    /// Creates a frontend, resolving a relative project folder against `base`.
    pub fn with_base(
        options: FrontendOptions,
        store: Arc<dyn AssetStore>,
        base: &Path,
    ) -> Result<Self> {
        let options = options.normalize(base)?;

        let root = ResolvedRoot::new(&options.store_folder, &options.dist_folder);
        let resolver = StaticResolver::new(store, root)
            .with_framework(options.framework)
            .with_fallback_document(options.fallback_document.clone());

        let launcher = CommandLauncher::new(Duration::from_secs(options.dev_startup_timeout_secs));
        let dev_server = DevServer::new(Arc::new(launcher), options.manifest.clone());

        let fixed_proxy = match options.fixed_dev_url() {
            Some(url) => Some(Arc::new(ReverseProxy::for_url(&url)?) as Arc<dyn Forward>),
            None => None,
        };

        tracing::debug!(
            mode = ?options.mode,
            framework = ?options.framework,
            root = %resolver.root().as_str(),
            project = %options.project_folder.display(),
            "Frontend configured"
        );

        Ok(Self {
            options,
            resolver,
            dev_server,
            fixed_proxy,
        })
    }

    /// Replaces the transform applied to the SPA fallback document.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn FallbackInterceptor>) -> Self {
        self.resolver = self.resolver.with_interceptor(interceptor);
        self
    }

    /// Replaces how the dev-server process is started.
    pub fn with_launcher(mut self, launcher: Arc<dyn DevServerLauncher>) -> Self {
        self.dev_server = DevServer::new(launcher, self.options.manifest.clone());
        self
    }

    pub fn options(&self) -> &FrontendOptions {
        &self.options
    }

    /// Starts the dev server when running in development mode without
    /// `skip_dev_server`. Does nothing otherwise.
    pub async fn init(&self) -> Result<()> {
        if self.options.mode == OperatingMode::Development && !self.options.skip_dev_server {
            self.start_dev_server().await?;
        }
        Ok(())
    }

    /// Starts the dev server in the project folder and returns its URL.
    ///
    /// Refused with `FrontendError::ReleaseMode` when serving the release
    /// build, where a dev server would never receive traffic.
    pub async fn start_dev_server(&self) -> Result<Url> {
        if self.options.mode == OperatingMode::Release {
            return Err(FrontendError::ReleaseMode);
        }
        self.dev_server
            .start(&self.options.project_folder, &self.options.dev_command)
            .await
    }

    pub async fn stop_dev_server(&self) -> Result<()> {
        self.dev_server.stop().await
    }

    pub async fn dev_server_running(&self) -> bool {
        self.dev_server.is_running().await
    }

    /// Handles one request according to the operating mode.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        match self.options.mode {
            OperatingMode::Release => {
                let (parts, _body) = request.into_parts();
                self.resolver.resolve(&parts).await.into_response()
            }
            OperatingMode::Development => {
                if let Some(proxy) = self.dev_server.proxy().await {
                    return proxy.forward(request).await;
                }
                if let Some(proxy) = &self.fixed_proxy {
                    return proxy.forward(request).await;
                }
                tracing::warn!(path = %request.uri().path(), "No dev server to proxy to");
                (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE_MESSAGE).into_response()
            }
        }
    }

    /// Router that answers every method and path with this frontend.
    pub fn router(self: Arc<Self>) -> Router {
        Router::new().fallback(serve).with_state(self)
    }
}

async fn serve(State(frontend): State<Arc<Frontend>>, request: Request<Body>) -> Response {
    frontend.handle(request).await
}
