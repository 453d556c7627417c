//! Store backed by a directory on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{Asset, AssetStore};
use crate::error::AssetError;

/// Serves files below a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory this store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

#[async_trait]
impl AssetStore for LocalStore {
    async fn open(&self, path: &str) -> Result<Asset, AssetError> {
        let full_path = self.full_path(path);

        let metadata = match tokio::fs::metadata(&full_path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AssetError::NotFound(path.to_string()))
            }
            Err(e) => return Err(AssetError::Io(e)),
        };

        if metadata.is_dir() {
            return Ok(Asset::Directory);
        }

        let data = tokio::fs::read(&full_path).await?;
        Ok(Asset::File(Bytes::from(data)))
    }
}
