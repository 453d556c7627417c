//! Frontend options and their normalization.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which side of the frontend is served.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Proxy everything to the frontend dev server.
    #[default]
    Development,
    /// Serve the pre-built assets from the asset store.
    Release,
}

/// Framework-specific resolution policy.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FrameworkType {
    #[default]
    Generic,
    /// Generators that emit extensionless routes as `.html` files (Next.js export, etc).
    #[serde(alias = "ssg", alias = "nextjs")]
    StaticSiteGenerator,
}

/// Options for a [`Frontend`](crate::Frontend).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FrontendOptions {
    pub mode: OperatingMode,
    pub framework: FrameworkType,
    /// Frontend project folder on disk. Relative paths are resolved by [`normalize`](Self::normalize).
    pub project_folder: PathBuf,
    /// Location of the project folder inside the asset store. Empty when the
    /// store is mounted at the project folder itself.
    pub store_folder: String,
    /// Build-output folder below the project folder.
    pub dist_folder: String,
    /// Document served for unmatched routes.
    pub fallback_document: String,
    pub dev_command: String,
    /// Manifest whose presence marks a valid project folder.
    pub manifest: String,
    /// Do not spawn the dev server; proxy to `dev_port` instead when set.
    pub skip_dev_server: bool,
    pub dev_port: Option<u16>,
    pub dev_startup_timeout_secs: u64,
}

impl Default for FrontendOptions {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            framework: FrameworkType::default(),
            project_folder: PathBuf::from("frontend"),
            store_folder: String::new(),
            dist_folder: "dist".to_string(),
            fallback_document: "index.html".to_string(),
            dev_command: "yarn dev".to_string(),
            manifest: "package.json".to_string(),
            skip_dev_server: false,
            dev_port: None,
            dev_startup_timeout_secs: 60,
        }
    }
}

impl FrontendOptions {
    /// Returns a copy with `project_folder` made absolute against `base`.
    ///
    /// A relative `base` is itself resolved against the current directory.
    /// Absolute project folders are kept as they are.
    pub fn normalize(&self, base: &Path) -> Result<Self> {
        let mut normalized = self.clone();
        if self.project_folder.is_absolute() {
            return Ok(normalized);
        }

        let base = if base.is_absolute() {
            base.to_path_buf()
        } else {
            std::env::current_dir()?.join(base)
        };
        normalized.project_folder = base.join(&self.project_folder);
        Ok(normalized)
    }

    /// Address of a dev server started outside this process, if configured.
    pub fn fixed_dev_url(&self) -> Option<String> {
        match (self.skip_dev_server, self.dev_port) {
            (true, Some(port)) => Some(format!("http://localhost:{}", port)),
            _ => None,
        }
    }
}
