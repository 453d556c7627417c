//! Embedded frontend build
//!
//! Embeds the frontend's `dist/` output into the binary for single-file deployment.

use std::sync::Arc;

use rust_embed::RustEmbed;
use spa_frontend::{AssetStore, EmbeddedStore};

/// The frontend project folder, filtered to its build output. Paths keep the
/// `dist/` prefix, which matches the default `dist_folder`.
#[derive(RustEmbed)]
#[folder = "frontend/"]
#[include = "dist/*"]
pub struct FrontendAssets;

/// Asset store over the embedded build.
pub fn embedded_store() -> Arc<dyn AssetStore> {
    Arc::new(EmbeddedStore::<FrontendAssets>::new())
}
