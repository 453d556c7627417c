//! Serve a single-page frontend from a Rust HTTP server.
//!
//! In development mode every request is proxied to the frontend's dev server
//! (`yarn dev`, `vite`, `next dev`, ...). In release mode the pre-built assets
//! are served from an [`AssetStore`], usually embedded into the binary, with
//! SPA fallback to `index.html` for client-side routes.
//!
//! ```ignore
//! use std::sync::Arc;
//! use rust_embed::RustEmbed;
//! use spa_frontend::{EmbeddedStore, Frontend, FrontendOptions, OperatingMode};
//!
//! #[derive(RustEmbed)]
//! #[folder = "frontend/"]
//! struct Assets;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let options = FrontendOptions {
//!     mode: OperatingMode::Release,
//!     ..Default::default()
//! };
//! let frontend = Arc::new(Frontend::new(options, Arc::new(EmbeddedStore::<Assets>::new()))?);
//! frontend.init().await?;
//! let app = axum::Router::new().fallback_service(frontend.router());
//! # Ok(())
//! # }
//! ```

pub mod devserver;
pub mod error;
pub mod frontend;
pub mod interceptor;
pub mod options;
pub mod proxy;
pub mod resolver;
pub mod store;

pub use devserver::{CommandLauncher, DevServer, DevServerHandle, DevServerLauncher, LaunchedDevServer};
pub use error::{AssetError, FrontendError, Result};
pub use frontend::Frontend;
pub use interceptor::FallbackInterceptor;
pub use options::{FrameworkType, FrontendOptions, OperatingMode};
pub use proxy::{Forward, ReverseProxy};
pub use resolver::{RequestOutcome, StaticResolver};
pub use store::{Asset, AssetStore, EmbeddedStore, LocalStore, ResolvedRoot};
