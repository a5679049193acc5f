//! Axum-based edge gateway server.
//!
//! [`GatewayServer`] builds the route table, proxy engine, auth router,
//! legacy guard and static fallback from a [`GatewayConfig`], and serves them
//! behind a single dispatch handler. Every request is resolved against the
//! ordered [`RouteTable`]; axum's own routing is not used for precedence.
//!
//! | Path | Target |
//! |------|--------|
//! | auth base path, exact and subtree | in-process [`AuthHandler`] |
//! | `/_legacy/auth/*` (when enabled) | core backend, behind the guard header |
//! | `/api/*` | core backend |
//! | `/ui`, `/ui/*` | device UI, `/ui` stripped |
//! | everything else | dev server or static SPA |

use crate::auth::{AuthHandler, AuthRouter, UnavailableAuthHandler};
use crate::backend::{ProxiedRequest, ProxyEngine, StaticFallback};
use crate::error::{ProxyError, ProxyResult, StartupError};
use crate::filter::{LegacyGuard, forwarded_headers};
use acs_kernel::gateway::{GatewayConfig, Origin, RouteMatch, RouteTable, RouteTarget};
use axum::{
    Router,
    extract::{ConnectInfo, Request, State},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, info_span, warn};
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Shared application state
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the dispatch handler needs. Built once, shared by `Arc`.
struct GatewayState {
    routes: RouteTable,
    proxy: ProxyEngine,
    auth: AuthRouter,
    /// Present only when the legacy tunnel is enabled.
    legacy_guard: Option<LegacyGuard>,
    /// Present only when there is no dev server.
    static_files: Option<StaticFallback>,
    max_body_bytes: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

pub struct GatewayServer {
    config: GatewayConfig,
    auth_handler: Arc<dyn AuthHandler>,
}

impl GatewayServer {
    /// New server with no auth subsystem: auth paths answer `503` until
    /// [`with_auth_handler`](Self::with_auth_handler) is called.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            auth_handler: Arc::new(UnavailableAuthHandler),
        }
    }

    pub fn with_auth_handler(mut self, handler: Arc<dyn AuthHandler>) -> Self {
        self.auth_handler = handler;
        self
    }

    /// Build the axum [`Router`].
    ///
    /// Validates the configuration first, so a returned app cannot hit a
    /// configuration error at request time.
    pub fn build_app(&self) -> Result<Router, StartupError> {
        let routes = RouteTable::from_config(&self.config)?;

        let proxy = ProxyEngine::new(Duration::from_millis(self.config.upstream_timeout_ms))?;
        let auth = AuthRouter::new(Arc::clone(&self.auth_handler), &self.config.auth)?;

        let legacy_guard = if self.config.legacy_tunnel.enabled {
            let guard = LegacyGuard::from_config(&self.config.legacy_tunnel)?;
            if !guard.is_enforced() {
                warn!(
                    header = %guard.header(),
                    "legacy auth tunnel is enabled without a token; requests are not checked"
                );
            }
            Some(guard)
        } else {
            None
        };

        let static_files = match routes.fallback() {
            RouteTarget::Static => Some(StaticFallback::new(&self.config.static_dir)?),
            _ => None,
        };

        let state = GatewayState {
            routes,
            proxy,
            auth,
            legacy_guard,
            static_files,
            max_body_bytes: self.config.max_body_bytes,
        };

        Ok(Router::new()
            .fallback(dispatch)
            .with_state(Arc::new(state))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|req: &Request| {
                        let request_id = Uuid::new_v4();
                        info_span!(
                            "request",
                            %request_id,
                            method = %req.method(),
                            path = %req.uri().path()
                        )
                    })
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            ))
    }

    /// Bind the configured address and serve until the process exits.
    pub async fn start(self) -> Result<(), StartupError> {
        let app = self.build_app()?;
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| StartupError::Bind {
                addr: addr.clone(),
                source,
            })?;
        run(listener, app).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), StartupError> {
        let app = self.build_app()?;
        run(listener, app).await
    }
}

async fn run(listener: TcpListener, app: Router) -> Result<(), StartupError> {
    let addr = listener.local_addr().map_err(StartupError::Serve)?;
    info!(addr = %addr, "ACS edge gateway listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(StartupError::Serve)
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

async fn dispatch(State(state): State<Arc<GatewayState>>, req: Request) -> Response {
    let path = req.uri().path().to_string();
    let RouteMatch {
        rule_id,
        target,
        path: forward_path,
    } = state.routes.resolve(&path);
    debug!(rule = rule_id, path = %forward_path, "route resolved");

    match target {
        RouteTarget::Auth => state.auth.handle(req).await,
        RouteTarget::LegacyTunnel(origin) => {
            if let Some(guard) = &state.legacy_guard {
                if let Err(rejection) = guard.check(req.headers()) {
                    return rejection.into_response();
                }
            }
            proxy_to(&state, origin, forward_path.into_owned(), req)
                .await
                .into_response()
        }
        RouteTarget::Proxy(origin) => proxy_to(&state, origin, forward_path.into_owned(), req)
            .await
            .into_response(),
        RouteTarget::Static => match &state.static_files {
            Some(files) => files.serve(req).await,
            None => ProxyError::Internal("static file serving is not configured".to_string())
                .into_response(),
        },
    }
}

async fn proxy_to(
    state: &GatewayState,
    origin: &Origin,
    path: String,
    req: Request,
) -> ProxyResult<Response> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let extra = forwarded_headers(req.headers(), peer);

    let proxied = ProxiedRequest::from_request(req, path, state.max_body_bytes).await?;
    state.proxy.forward(origin, proxied, &extra).await
}
