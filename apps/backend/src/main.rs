use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backend::{assets, build_router, config::Config, error::AppError, AppState};
use spa_frontend::Frontend;

fn init_tracing() {
    // Initialize tracing with env-filter
    // RUST_LOG environment variable controls log levels
    // Default: debug for our crates, info for axum, warn for dependencies
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("backend=debug,spa_frontend=debug,tower_http=debug,axum=info,warn")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

async fn serve(state: AppState) -> Result<(), AppError> {
    let addr = state.config.server_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Backend listening on {}", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn run(config: Config) -> Result<(), AppError> {
    let frontend = Frontend::new(config.frontend.clone(), assets::embedded_store())?;

    // Start the dev server before accepting requests so the first ones are proxied
    frontend.init().await?;

    let state = AppState::new(config, frontend);
    let served = serve(state.clone()).await;

    // Stop the dev server whether serving ended cleanly or not
    if state.frontend().dev_server_running().await {
        tracing::info!("Stopping frontend dev server");
        if let Err(e) = state.frontend().stop_dev_server().await {
            tracing::error!("Failed to stop dev server: {}", e);
        }
    }

    served
}

#[tokio::main]
async fn main() {
    // Initialize tracing first so we can log configuration loading
    init_tracing();

    tracing::info!("Starting Backend v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match Config::load() {
        Ok(cfg) => {
            tracing::info!("Configuration loaded successfully");
            tracing::debug!("Server: {}:{}", cfg.server.host, cfg.server.port);
            tracing::debug!("Frontend mode: {:?}", cfg.frontend.mode);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config).await {
        tracing::error!("Backend failed: {}", e);
        std::process::exit(1);
    }
}
