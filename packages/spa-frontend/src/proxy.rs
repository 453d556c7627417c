//! Reverse proxy to a frontend dev server.
//!
//! Requests are forwarded with their method, headers and body; only `Host`
//! is rewritten (by the client, from the target URL), the original host and
//! scheme travel in `X-Forwarded-*`, and hop-by-hop headers are dropped in
//! both directions. Request and response bodies are streamed as they
//! arrive. Dropping the response future or body, which is what hyper does
//! when the client goes away, closes the upstream connection with it.

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use reqwest::{redirect, Client, Url};

use crate::error::{FrontendError, Result};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Headers that describe a single hop and must not be relayed.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Capability to forward a request to some upstream and relay its answer.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(&self, request: Request<Body>) -> Response;
}

/// Forwards requests to a single upstream base URL.
pub struct ReverseProxy {
    client: Client,
    target: Url,
}

impl ReverseProxy {
    pub fn new(target: Url) -> Result<Self> {
        // Redirects belong to the browser, and the dev server is always local.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .no_proxy()
            .build()?;

        Ok(Self { client, target })
    }

    /// Parses `target` and builds a proxy for it.
    pub fn for_url(target: &str) -> Result<Self> {
        let url = Url::parse(target).map_err(|_| FrontendError::InvalidUrl(target.to_string()))?;
        Self::new(url)
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Maps an inbound URI onto the target, joining paths with a single slash
    /// and merging query strings.
    fn upstream_url(&self, uri: &Uri) -> Url {
        let mut url = self.target.clone();

        let base = self.target.path();
        let path = uri.path();
        let joined = match (base.ends_with('/'), path.starts_with('/')) {
            (true, true) => format!("{}{}", base, &path[1..]),
            (false, false) => format!("{}/{}", base, path),
            _ => format!("{}{}", base, path),
        };
        url.set_path(&joined);

        let query = match (self.target.query(), uri.query()) {
            (Some(a), Some(b)) if !a.is_empty() => Some(format!("{}&{}", a, b)),
            (Some(a), None) => Some(a.to_string()),
            (_, Some(b)) => Some(b.to_string()),
            (None, None) => None,
        };
        url.set_query(query.as_deref());

        url
    }

    async fn try_forward(&self, request: Request<Body>) -> Result<Response> {
        let (parts, body) = request.into_parts();
        let url = self.upstream_url(&parts.uri);

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        if let Some(host) = headers.remove(header::HOST) {
            headers.insert(X_FORWARDED_HOST, host);
        }
        if !headers.contains_key(&X_FORWARDED_PROTO) {
            let proto = if parts.uri.scheme_str() == Some("https") {
                "https"
            } else {
                "http"
            };
            headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(proto));
        }

        tracing::debug!(method = %parts.method, url = %url, "Proxying request to dev server");

        let mut upstream = self.client.request(parts.method, url).headers(headers);
        // Bodies are streamed through; an empty one stays empty rather than
        // becoming a zero-length chunked upload.
        if body.size_hint().exact() != Some(0) {
            upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }
        let upstream = upstream.send().await?;

        let status = upstream.status();
        let mut response_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut response_headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = response_headers;
        Ok(response)
    }
}

#[async_trait]
impl Forward for ReverseProxy {
    async fn forward(&self, request: Request<Body>) -> Response {
        match self.try_forward(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(upstream = %self.target, error = %e, "Dev server unreachable");
                bad_gateway()
            }
        }
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop as well.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
        "Frontend dev server is unreachable",
    )
        .into_response()
}
