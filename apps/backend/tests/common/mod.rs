//! Test infrastructure for backend integration tests.
//!
//! Provides a `TestApp` wrapper around `axum_test::TestServer` that mounts the
//! embedded frontend build behind the production router.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum_test::TestServer;

use backend::config::{Config, ServerConfig};
use backend::{assets, build_router, AppState};
use spa_frontend::{
    DevServerHandle, DevServerLauncher, Frontend, FrontendOptions, LaunchedDevServer,
    OperatingMode,
};

/// Test application wrapper around axum_test::TestServer.
pub struct TestApp {
    server: TestServer,
    state: AppState,
}

impl TestApp {
    /// Create a test application serving the embedded build in release mode.
    pub fn release() -> Self {
        Self::with_options(
            FrontendOptions {
                mode: OperatingMode::Release,
                ..Default::default()
            },
            None,
        )
    }

    /// Create a development-mode test application whose dev server is
    /// "started" by a launcher that spawns nothing.
    pub fn development(project: &Path, launcher: Arc<StubLauncher>) -> Self {
        Self::with_options(
            FrontendOptions {
                mode: OperatingMode::Development,
                project_folder: project.to_path_buf(),
                skip_dev_server: true,
                ..Default::default()
            },
            Some(launcher),
        )
    }

    fn with_options(options: FrontendOptions, launcher: Option<Arc<StubLauncher>>) -> Self {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            frontend: options.clone(),
        };

        let mut frontend =
            Frontend::new(options, assets::embedded_store()).expect("Failed to build frontend");
        if let Some(launcher) = launcher {
            frontend = frontend.with_launcher(launcher);
        }

        // Same router as main.rs
        let state = AppState::new(config, frontend);
        let server =
            TestServer::new(build_router(state.clone())).expect("Failed to create test server");

        Self { server, state }
    }

    /// Get a reference to the test server.
    pub fn server(&self) -> &TestServer {
        &self.server
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Launcher that reports a dev server at a fixed URL without spawning anything.
pub struct StubLauncher {
    url: String,
    pub starts: AtomicUsize,
}

impl StubLauncher {
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: url.to_string(),
            starts: AtomicUsize::new(0),
        })
    }
}

struct StubHandle;

#[async_trait]
impl DevServerHandle for StubHandle {
    async fn stop(self: Box<Self>) -> spa_frontend::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl DevServerLauncher for StubLauncher {
    async fn start(&self, _folder: &Path, _command: &str) -> spa_frontend::Result<LaunchedDevServer> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(LaunchedDevServer {
            handle: Box::new(StubHandle),
            base_url: self.url.clone(),
        })
    }
}

/// Creates a frontend project folder holding a `package.json`.
pub fn project_folder() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("package.json"), r#"{"scripts":{"dev":"vite"}}"#)
        .expect("Failed to write package.json");
    dir
}
