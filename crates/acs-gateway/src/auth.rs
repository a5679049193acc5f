//! In-process delegation to the authentication subsystem.
//!
//! The gateway never interprets auth traffic. Requests under the auth base
//! path are handed, path and all, to an [`AuthHandler`] running in the same
//! process. Any axum [`Router`] is a handler, so an auth service built with
//! axum plugs in directly:
//!
//! ```rust,no_run
//! use acs_gateway::server::GatewayServer;
//! use acs_kernel::gateway::GatewayConfig;
//! use axum::{Router, routing::post};
//! use std::sync::Arc;
//!
//! let auth = Router::new().route("/api/auth/sign-in", post(|| async { "ok" }));
//! let server = GatewayServer::new(GatewayConfig::new("http://backend:3000", "http://ui:3001"))
//!     .with_auth_handler(Arc::new(auth));
//! ```
//!
//! Each delegated request carries the gateway's [`AuthConfig`] as a request
//! extension, so handlers read the public base URL and trusted origins with
//! axum's `Extension<AuthConfig>` extractor.

use crate::error::StartupError;
use acs_kernel::gateway::AuthConfig;
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::debug;

/// Opaque `handle(request) -> response` capability of the auth subsystem.
#[async_trait]
pub trait AuthHandler: Send + Sync {
    async fn handle(&self, req: Request) -> Response;
}

#[async_trait]
impl AuthHandler for Router {
    async fn handle(&self, req: Request) -> Response {
        let result: Result<Response, Infallible> = self.clone().oneshot(req).await;
        match result {
            Ok(resp) => resp,
            Err(never) => match never {},
        }
    }
}

/// Stand-in used when no auth subsystem is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableAuthHandler;

#[async_trait]
impl AuthHandler for UnavailableAuthHandler {
    async fn handle(&self, req: Request) -> Response {
        debug!(path = %req.uri().path(), "auth request with no auth subsystem");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "auth_unavailable" })),
        )
            .into_response()
    }
}

/// Auth subtree endpoint: the handler plus CORS for trusted origins.
#[derive(Clone)]
pub struct AuthRouter {
    router: Router,
    config: AuthConfig,
}

impl std::fmt::Debug for AuthRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRouter")
            .field("base_path", &self.config.base_path)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl AuthRouter {
    pub fn new(handler: Arc<dyn AuthHandler>, config: &AuthConfig) -> Result<Self, StartupError> {
        let mut router = Router::new().fallback(move |req: Request| {
            let handler = Arc::clone(&handler);
            async move { handler.handle(req).await }
        });

        if !config.trusted_origins.is_empty() {
            router = router.layer(trusted_origin_cors(&config.trusted_origins)?);
        }

        Ok(Self {
            router,
            config: config.clone(),
        })
    }

    /// Hand `req` to the auth subsystem with the [`AuthConfig`] attached.
    pub async fn handle(&self, mut req: Request) -> Response {
        req.extensions_mut().insert(self.config.clone());
        self.router.handle(req).await
    }
}

/// Credentialed CORS restricted to `origins`. Methods and headers mirror the
/// preflight request, since the auth subsystem owns its own surface.
fn trusted_origin_cors(origins: &[String]) -> Result<CorsLayer, StartupError> {
    let allowed = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|e| StartupError::InvalidHeader(origin.clone(), e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
