//! Test infrastructure for spa-frontend integration tests.
//!
//! Provides embedded fixture assets, a fake dev-server launcher and a real
//! upstream HTTP server that echoes what it receives.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use axum_test::TestServer;
use rust_embed::RustEmbed;
use serde_json::json;
use tokio::net::TcpListener;

use spa_frontend::{
    DevServerHandle, DevServerLauncher, EmbeddedStore, Frontend, FrontendOptions,
    LaunchedDevServer, OperatingMode,
};

/// The files under `tests/fixtures/`, so store paths start with `dist/`.
#[derive(RustEmbed)]
#[folder = "tests/fixtures/"]
pub struct Fixtures;

/// Release-mode options over the embedded fixtures.
pub fn release_options() -> FrontendOptions {
    FrontendOptions {
        mode: OperatingMode::Release,
        ..Default::default()
    }
}

/// Builds a release frontend over the embedded fixtures.
pub fn release_frontend(options: FrontendOptions) -> Frontend {
    Frontend::new(options, Arc::new(EmbeddedStore::<Fixtures>::new()))
        .expect("Failed to build release frontend")
}

/// Wraps a frontend into an axum-test server.
pub fn serve(frontend: Frontend) -> (TestServer, Arc<Frontend>) {
    let frontend = Arc::new(frontend);
    let server =
        TestServer::new(Arc::clone(&frontend).router()).expect("Failed to create test server");
    (server, frontend)
}

/// A real HTTP server on a loopback port standing in for a frontend dev server.
pub struct Upstream {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
    /// Chunks produced so far by `/stream`.
    pub produced: Arc<AtomicUsize>,
    /// Set once the `/endless` body has been dropped by the server.
    pub endless_dropped: Arc<AtomicBool>,
}

/// Sets its flag when dropped, i.e. when the body stream holding it goes away.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A chunked body emitting `chunk<N>;` every 100ms, `limit` times or forever.
fn ticking(limit: Option<usize>, produced: Arc<AtomicUsize>, dropped: Arc<AtomicBool>) -> Body {
    let stream = futures::stream::unfold((0usize, DropFlag(dropped)), move |(n, flag)| {
        let produced = Arc::clone(&produced);
        async move {
            if limit.map_or(false, |limit| n >= limit) {
                return None;
            }
            if n > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            produced.fetch_add(1, Ordering::SeqCst);
            let chunk = Bytes::from(format!("chunk{};", n));
            Some((Ok::<_, std::io::Error>(chunk), (n + 1, flag)))
        }
    });
    Body::from_stream(stream)
}

impl Upstream {
    pub async fn spawn() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let produced = Arc::new(AtomicUsize::new(0));
        let endless_dropped = Arc::new(AtomicBool::new(false));
        let stream_produced = Arc::clone(&produced);
        let endless_flag = Arc::clone(&endless_dropped);

        let app = Router::new()
            .route("/redirect", get(|| async { (StatusCode::FOUND, [("location", "/elsewhere")]) }))
            .route(
                "/created",
                get(|| async {
                    (
                        StatusCode::CREATED,
                        [("x-upstream", "yes"), ("content-type", "text/plain")],
                        "made",
                    )
                }),
            )
            .route(
                "/stream",
                get(move || {
                    let produced = Arc::clone(&stream_produced);
                    async move { ticking(Some(3), produced, Arc::new(AtomicBool::new(false))) }
                }),
            )
            .route(
                "/endless",
                get(move || {
                    let dropped = Arc::clone(&endless_flag);
                    async move { ticking(None, Arc::new(AtomicUsize::new(0)), dropped) }
                }),
            )
            .fallback(move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    echo(method, uri, headers, body)
                }
            });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind upstream listener");
        let addr = listener.local_addr().expect("Upstream has no local address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{}", addr),
            hits,
            produced,
            endless_dropped,
        }
    }

    pub fn port(&self) -> u16 {
        self.url
            .rsplit(':')
            .next()
            .and_then(|port| port.parse().ok())
            .expect("Upstream URL has no port")
    }
}

fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "host": header("host"),
        "forwarded_host": header("x-forwarded-host"),
        "forwarded_proto": header("x-forwarded-proto"),
        "custom": header("x-custom"),
        "connection": header("connection"),
        "transfer_encoding": header("transfer-encoding"),
        "body_len": body.len(),
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response()
}

/// Launcher that "starts" a dev server already listening at `url`.
pub struct FakeLauncher {
    url: String,
    pub stopped: Arc<AtomicBool>,
    pub starts: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: url.to_string(),
            stopped: Arc::new(AtomicBool::new(false)),
            starts: AtomicUsize::new(0),
        })
    }
}

struct FakeHandle {
    stopped: Arc<AtomicBool>,
}

#[async_trait]
impl DevServerHandle for FakeHandle {
    async fn stop(self: Box<Self>) -> spa_frontend::Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl DevServerLauncher for FakeLauncher {
    async fn start(&self, _folder: &Path, _command: &str) -> spa_frontend::Result<LaunchedDevServer> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(LaunchedDevServer {
            handle: Box::new(FakeHandle {
                stopped: Arc::clone(&self.stopped),
            }),
            base_url: self.url.clone(),
        })
    }
}

/// Creates a project folder holding a `package.json`.
pub fn project_folder() -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("package.json"), r#"{"scripts":{"dev":"vite"}}"#)
        .expect("Failed to write package.json");
    dir
}

/// Development-mode options rooted at `project`.
pub fn dev_options(project: &Path) -> FrontendOptions {
    FrontendOptions {
        mode: OperatingMode::Development,
        project_folder: project.to_path_buf(),
        ..Default::default()
    }
}
