//! Transforms applied to the SPA fallback document before it is written.
//!
//! Interceptors only ever see the fallback document. Exact-match assets are
//! streamed verbatim.

use std::sync::Arc;

use axum::http::request::Parts;
use bytes::Bytes;

/// A transform over the fallback document bytes.
///
/// Any `Fn(&Parts, Bytes) -> Bytes` closure is an interceptor.
pub trait FallbackInterceptor: Send + Sync {
    fn intercept(&self, request: &Parts, document: Bytes) -> Bytes;
}

impl<F> FallbackInterceptor for F
where
    F: Fn(&Parts, Bytes) -> Bytes + Send + Sync,
{
    fn intercept(&self, request: &Parts, document: Bytes) -> Bytes {
        self(request, document)
    }
}

/// The default interceptor: returns the document untouched.
pub fn identity() -> Arc<dyn FallbackInterceptor> {
    Arc::new(|_: &Parts, document: Bytes| document)
}

/// Inserts `snippet` right before the closing `</head>` tag.
///
/// Typical use is injecting runtime configuration as an inline script.
/// Documents without a `</head>` get the snippet prepended.
pub fn inject_into_head(snippet: impl Into<String>) -> Arc<dyn FallbackInterceptor> {
    let snippet = snippet.into();
    Arc::new(move |_: &Parts, document: Bytes| inject_before(&document, b"</head>", snippet.as_bytes()))
}

fn inject_before(content: &[u8], pattern: &[u8], snippet: &[u8]) -> Bytes {
    let pos = content
        .windows(pattern.len())
        .position(|w| w.eq_ignore_ascii_case(pattern))
        .unwrap_or(0);

    let mut result = Vec::with_capacity(content.len() + snippet.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(snippet);
    result.extend_from_slice(&content[pos..]);
    Bytes::from(result)
}
