//! Store backed by files embedded into the binary with rust-embed.

use std::borrow::Cow;
use std::marker::PhantomData;

use async_trait::async_trait;
use bytes::Bytes;
use rust_embed::RustEmbed;

use super::{Asset, AssetStore};
use crate::error::AssetError;

/// Serves the assets of a `#[derive(RustEmbed)]` type.
///
/// rust-embed only records files, so a path is reported as a directory when it
/// is the root or when any embedded file lives below it.
pub struct EmbeddedStore<E> {
    _assets: PhantomData<fn() -> E>,
}

impl<E: RustEmbed> EmbeddedStore<E> {
    pub fn new() -> Self {
        Self {
            _assets: PhantomData,
        }
    }

    fn is_directory(path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        let prefix = format!("{}/", path);
        E::iter().any(|name| name.starts_with(&prefix))
    }
}

impl<E: RustEmbed> Default for EmbeddedStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: RustEmbed + 'static> AssetStore for EmbeddedStore<E> {
    async fn open(&self, path: &str) -> Result<Asset, AssetError> {
        if let Some(file) = E::get(path) {
            let data = match file.data {
                Cow::Borrowed(bytes) => Bytes::from_static(bytes),
                Cow::Owned(bytes) => Bytes::from(bytes),
            };
            return Ok(Asset::File(data));
        }

        if Self::is_directory(path) {
            return Ok(Asset::Directory);
        }

        Err(AssetError::NotFound(path.to_string()))
    }
}
