//! Release-mode asset resolution.
//!
//! Resolution is an ordered cascade that stops at the first hit:
//!
//! 1. the exact path;
//! 2. for directories, a temporary redirect to the slash-terminated path, or
//!    the nested `index.html` once the client already asked with a slash;
//! 3. `path.html` for static site generators;
//! 4. the SPA fallback document, passed through the interceptor;
//! 5. `NotFound`.
//!
//! Every store failure inside the cascade is recovered into the next step.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, request::Parts, Response, StatusCode},
    response::{IntoResponse, Redirect},
};
use bytes::Bytes;

use crate::error::AssetError;
use crate::interceptor::{self, FallbackInterceptor};
use crate::options::FrameworkType;
use crate::store::{join_path, normalize_request_path, Asset, AssetStore, ResolvedRoot};

const INDEX_DOCUMENT: &str = "index.html";
const HTML_CONTENT_TYPE: &str = "text/html";

/// The resolver's answer for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// An asset matched; bytes are sent verbatim.
    Served { body: Bytes, content_type: String },
    /// Temporary redirect to the slash-terminated location.
    Redirect(String),
    /// The SPA fallback document, after interception.
    FallbackServed { body: Bytes },
    NotFound,
}

impl IntoResponse for RequestOutcome {
    fn into_response(self) -> axum::response::Response {
        match self {
            RequestOutcome::Served { body, content_type } => {
                content_response(StatusCode::OK, &content_type, body)
            }
            RequestOutcome::FallbackServed { body } => {
                content_response(StatusCode::OK, HTML_CONTENT_TYPE, body)
            }
            RequestOutcome::Redirect(location) => Redirect::temporary(&location).into_response(),
            RequestOutcome::NotFound => (StatusCode::NOT_FOUND, "Not found").into_response(),
        }
    }
}

fn content_response(status: StatusCode, content_type: &str, body: Bytes) -> axum::response::Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to build asset response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

/// Resolves request paths against a mounted root of an asset store.
pub struct StaticResolver {
    store: Arc<dyn AssetStore>,
    root: ResolvedRoot,
    framework: FrameworkType,
    fallback_document: String,
    interceptor: Arc<dyn FallbackInterceptor>,
}

impl StaticResolver {
    pub fn new(store: Arc<dyn AssetStore>, root: ResolvedRoot) -> Self {
        Self {
            store,
            root,
            framework: FrameworkType::Generic,
            fallback_document: INDEX_DOCUMENT.to_string(),
            interceptor: interceptor::identity(),
        }
    }

    pub fn with_framework(mut self, framework: FrameworkType) -> Self {
        self.framework = framework;
        self
    }

    pub fn with_fallback_document(mut self, document: impl Into<String>) -> Self {
        self.fallback_document = document.into();
        self
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn FallbackInterceptor>) -> Self {
        self.interceptor = interceptor;
        self
    }

    pub fn root(&self) -> &ResolvedRoot {
        &self.root
    }

    /// Resolves the request's path. Never fails; misses end in `NotFound`.
    pub async fn resolve(&self, request: &Parts) -> RequestOutcome {
        let path = request.uri.path();

        let relative = match normalize_request_path(path) {
            Ok(relative) => relative,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Rejected request path");
                return RequestOutcome::NotFound;
            }
        };

        match self.open_file(&relative).await {
            Ok(body) => return served(&relative, body),
            Err(AssetError::IsDirectory(_)) => {
                // The redirect must only fire on the client-visible path, or
                // `/about/` would bounce forever.
                if !path.ends_with('/') {
                    let location = slash_terminated(&relative, request.uri.query());
                    tracing::debug!(path = %path, location = %location, "Redirecting directory");
                    return RequestOutcome::Redirect(location);
                }

                let index = join_path(&relative, INDEX_DOCUMENT);
                match self.open_file(&index).await {
                    Ok(body) => return served(&index, body),
                    Err(e) => self.log_miss(&index, &e),
                }
            }
            Err(e) => self.log_miss(&relative, &e),
        }

        if self.framework == FrameworkType::StaticSiteGenerator && !relative.is_empty() {
            let suffixed = format!("{}.html", relative);
            match self.open_file(&suffixed).await {
                Ok(body) => return served(&suffixed, body),
                Err(e) => self.log_miss(&suffixed, &e),
            }
        }

        self.fallback(request).await
    }

    async fn fallback(&self, request: &Parts) -> RequestOutcome {
        match self.open_file(&self.fallback_document).await {
            Ok(document) => {
                tracing::debug!(path = %request.uri.path(), "Serving SPA fallback document");
                let body = self.interceptor.intercept(request, document);
                RequestOutcome::FallbackServed { body }
            }
            Err(e) => {
                tracing::warn!(
                    root = %self.root.as_str(),
                    document = %self.fallback_document,
                    error = %e,
                    "SPA fallback document unavailable"
                );
                RequestOutcome::NotFound
            }
        }
    }

    /// Opens a regular file below the root, reporting directories as
    /// `AssetError::IsDirectory`.
    async fn open_file(&self, relative: &str) -> Result<Bytes, AssetError> {
        match self.store.open(&self.root.join(relative)).await? {
            Asset::File(body) => Ok(body),
            Asset::Directory => Err(AssetError::IsDirectory(relative.to_string())),
        }
    }

    fn log_miss(&self, relative: &str, error: &AssetError) {
        match error {
            AssetError::Io(e) => {
                tracing::warn!(path = %relative, error = %e, "Asset store read failed")
            }
            _ => tracing::debug!(path = %relative, "No asset at path"),
        }
    }
}

fn served(relative: &str, body: Bytes) -> RequestOutcome {
    let content_type = mime_guess::from_path(relative)
        .first_or_octet_stream()
        .to_string();
    RequestOutcome::Served { body, content_type }
}

/// Builds the redirect target from the normalized path, never the raw one, so
/// `//host` style requests cannot turn into protocol-relative locations.
fn slash_terminated(relative: &str, query: Option<&str>) -> String {
    let mut location = String::from("/");
    for segment in relative.split('/').filter(|segment| !segment.is_empty()) {
        location.push_str(&urlencoding::encode(segment));
        location.push('/');
    }
    match query {
        Some(query) => format!("{}?{}", location, query),
        None => location,
    }
}
