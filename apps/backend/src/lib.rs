//! Backend host library
//!
//! Mounts a single-page frontend behind a small API surface.
//! This library exposes modules for use in integration tests.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use spa_frontend::{Frontend, OperatingMode};
use tower_http::trace::TraceLayer;

pub mod assets;
pub mod config;
pub mod error;

use config::Config;
use error::Result;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub frontend: Arc<Frontend>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(config: Config, frontend: Frontend) -> Self {
        Self {
            config: Arc::new(config),
            frontend: Arc::new(frontend),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get a reference to the mounted frontend.
    pub fn frontend(&self) -> &Frontend {
        &self.frontend
    }

    /// Get the start time of the application.
    pub fn start_time(&self) -> std::time::Instant {
        self.start_time
    }
}

#[derive(Serialize)]
pub struct ApiResponse {
    pub message: String,
    pub version: String,
}

pub async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Backend is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
pub struct FrontendStatus {
    pub listen: String,
    pub mode: OperatingMode,
    pub dev_server_running: bool,
    pub uptime_secs: u64,
}

/// Report how the frontend is being served.
pub async fn frontend_status(State(state): State<AppState>) -> Json<FrontendStatus> {
    Json(FrontendStatus {
        listen: state.config.server_addr().to_string(),
        mode: state.frontend.options().mode,
        dev_server_running: state.frontend.dev_server_running().await,
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
pub struct DevServerStarted {
    pub url: String,
}

/// Start the frontend dev server on demand.
pub async fn start_dev_server(State(state): State<AppState>) -> Result<Json<DevServerStarted>> {
    let url = state.frontend.start_dev_server().await?;
    tracing::info!(url = %url, "Dev server started on request");
    Ok(Json(DevServerStarted {
        url: url.to_string(),
    }))
}

/// Stop the running frontend dev server.
pub async fn stop_dev_server(State(state): State<AppState>) -> Result<StatusCode> {
    state.frontend.stop_dev_server().await?;
    tracing::info!("Dev server stopped on request");
    Ok(StatusCode::NO_CONTENT)
}

/// Build the application router.
///
/// API routes are matched first; every other request falls through to the
/// frontend, whatever its method or path.
pub fn build_router(state: AppState) -> Router {
    let frontend_routes = Router::new()
        .route("/", get(frontend_status))
        .route("/dev-server/start", post(start_dev_server))
        .route("/dev-server/stop", post(stop_dev_server));

    let frontend = Arc::clone(&state.frontend);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/frontend", frontend_routes)
        .with_state(state)
        .fallback_service(frontend.router())
        .layer(TraceLayer::new_for_http())
}
