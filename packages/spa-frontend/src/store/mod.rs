//! Read-only asset stores.
//!
//! A store maps `/`-separated relative paths to file contents. Paths handed to
//! a store are already sanitized by [`normalize_request_path`] and joined onto
//! a [`ResolvedRoot`]; stores never see `..` or leading separators.

mod embedded;
mod local;

pub use embedded::EmbeddedStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AssetError;

/// An entry opened from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    File(Bytes),
    Directory,
}

/// Trait defining the interface for asset storage backends.
///
/// Implementations must be safe to read concurrently; request handlers never
/// mutate a store.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Opens `path` relative to the store root.
    ///
    /// Returns `AssetError::NotFound` when nothing lives at `path`.
    async fn open(&self, path: &str) -> Result<Asset, AssetError>;
}

/// The root all lookups are confined to: project folder joined with the
/// build-output folder, expressed in store coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRoot(String);

impl ResolvedRoot {
    pub fn new(project_folder: &str, dist_folder: &str) -> Self {
        let joined = [project_folder, dist_folder]
            .iter()
            .flat_map(|part| part.split('/'))
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Joins a sanitized relative path onto the root.
    pub fn join(&self, relative: &str) -> String {
        join_path(&self.0, relative)
    }
}

/// Joins two `/`-separated relative paths, ignoring empty sides.
pub(crate) fn join_path(base: &str, relative: &str) -> String {
    match (base.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, relative),
    }
}

/// Turns a client-visible request path into a store-relative path.
///
/// The path is percent-decoded, empty and `.` segments are dropped, and any
/// attempt to climb out of the root is rejected with `AssetError::PathEscape`.
/// The root itself normalizes to the empty string.
pub fn normalize_request_path(path: &str) -> Result<String, AssetError> {
    // Escapes that are not UTF-8 become U+FFFD; such a path matches no asset
    // and continues down the cascade to the fallback.
    let decoded = urlencoding::decode_binary(path.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded);

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(AssetError::PathEscape(path.to_string())),
            s if s.contains('\\') || s.contains('\0') => {
                return Err(AssetError::PathEscape(path.to_string()))
            }
            // Drive prefixes such as `C:` only matter where they start a path.
            s if segments.is_empty() && s.ends_with(':') => {
                return Err(AssetError::PathEscape(path.to_string()))
            }
            s => segments.push(s),
        }
    }

    Ok(segments.join("/"))
}
