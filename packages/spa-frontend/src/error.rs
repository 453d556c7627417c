//! Error types for frontend serving.
//!
//! `FrontendError` is returned by the lifecycle and construction APIs.
//! `AssetError` is internal to the resolution cascade and never reaches an
//! HTTP client; every variant is recovered into the next cascade step or a 404.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors reported to callers of the frontend lifecycle API.
#[derive(Error, Debug)]
pub enum FrontendError {
    /// The project folder lacks the manifest file (`package.json` by default).
    #[error("Frontend manifest not found: {0}")]
    ConfigurationMissing(PathBuf),

    /// `start_dev_server` was called while a handle is live.
    #[error("Dev server is already running")]
    DevServerAlreadyRunning,

    /// A dev server was requested while serving the release build.
    #[error("Dev server is unavailable in release mode")]
    ReleaseMode,

    /// `stop_dev_server` was called with no live handle.
    #[error("Dev server is not running")]
    DevServerNotRunning,

    /// The dev-server process could not be started or exited early.
    #[error("Dev server failed to start: {0}")]
    DevServerStart(String),

    /// The dev-server never announced a URL.
    #[error("Dev server did not report a URL within {0:?}")]
    DevServerTimeout(Duration),

    /// The dev-server URL could not be parsed.
    #[error("Invalid dev server URL '{0}'")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for frontend operations.
pub type Result<T> = std::result::Result<T, FrontendError>;

/// Signals raised while opening a path inside an asset store.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset is a directory: {0}")]
    IsDirectory(String),

    /// The request path tried to leave the mounted root.
    #[error("Path escapes the mounted root: {0}")]
    PathEscape(String),

    #[error("Asset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_messages() {
        assert_eq!(
            FrontendError::DevServerAlreadyRunning.to_string(),
            "Dev server is already running"
        );
        assert_eq!(
            FrontendError::DevServerNotRunning.to_string(),
            "Dev server is not running"
        );
    }

    #[test]
    fn test_configuration_missing_names_path() {
        let error = FrontendError::ConfigurationMissing(PathBuf::from("/srv/app/package.json"));
        assert!(error.to_string().contains("/srv/app/package.json"));
    }
}
