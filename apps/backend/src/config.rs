//! Configuration module for the backend.
//!
//! Loads configuration from `config.toml` with environment variable overrides.

use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use spa_frontend::{FrontendOptions, OperatingMode};

use crate::error::AppError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub frontend: FrontendOptions,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` in current directory (optional)
    /// 3. Environment variables with `SPA_` prefix
    ///
    /// Environment variables use double underscore for nesting:
    /// - `SPA_SERVER__PORT=9000` sets `server.port`
    /// - `SPA_FRONTEND__MODE=release` sets `frontend.mode`
    /// - `SPA_FRONTEND__DEV_PORT=5173` sets `frontend.dev_port`
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(config_path: &str) -> Result<Self, AppError> {
        let config = ConfigLoader::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("frontend.mode", "development")?
            .set_default("frontend.project_folder", "frontend")?
            .set_default("frontend.dist_folder", "dist")?
            .set_default("frontend.fallback_document", "index.html")?
            .set_default("frontend.dev_command", "yarn dev")?
            // Add config file (optional)
            .add_source(File::with_name(config_path).required(false))
            // Override with environment variables
            // SPA_SERVER__PORT=9000 -> server.port = 9000
            .add_source(
                Environment::with_prefix("SPA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the frontend section.
    fn validate(&self) -> Result<(), AppError> {
        let frontend = &self.frontend;

        if frontend.fallback_document.trim().is_empty() {
            return Err(AppError::InvalidConfig(
                "frontend.fallback_document must not be empty".to_string(),
            ));
        }

        if frontend.mode == OperatingMode::Development
            && frontend.skip_dev_server
            && frontend.dev_port.is_none()
        {
            tracing::warn!(
                "Dev server auto-start is disabled and no dev port is set - frontend requests will get 503"
            );
        }

        Ok(())
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::{IpAddr, Ipv4Addr, SocketAddr};
        let ip: IpAddr = self.server.host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid host '{}', using 0.0.0.0", self.server.host);
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server.port)
    }
}
