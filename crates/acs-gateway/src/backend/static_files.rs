//! Single-page application file serving.
//!
//! Files are served from the build directory; any path without a matching
//! file gets `index.html` with status `200`, so client-side routes such as
//! `/inventory/onus` still load the app shell.

use crate::error::StartupError;
use axum::{body::Body, extract::Request, response::Response};
use std::convert::Infallible;
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};
use tracing::warn;

/// Document served for unknown paths.
pub const INDEX_FILE: &str = "index.html";

/// Static directory with index-document fallback.
#[derive(Clone, Debug)]
pub struct StaticFallback {
    root: PathBuf,
    service: ServeDir<ServeFile>,
}

impl StaticFallback {
    /// Serve `root`. Fails when the directory does not exist; a missing
    /// index document is only logged.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StartupError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StartupError::StaticDirMissing(root));
        }
        let index = root.join(INDEX_FILE);
        if !index.is_file() {
            warn!(
                index = %index.display(),
                "static index document is missing; deep links will 404"
            );
        }

        let service = ServeDir::new(&root).fallback(ServeFile::new(index));
        Ok(Self { root, service })
    }

    pub async fn serve(&self, req: Request) -> Response {
        let result: Result<_, Infallible> = self.service.clone().oneshot(req).await;
        match result {
            Ok(resp) => resp.map(Body::new),
            Err(never) => match never {},
        }
    }
}
