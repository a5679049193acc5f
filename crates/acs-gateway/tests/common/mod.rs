//! Shared fixtures: mock origins, SPA directories, request helpers.

#![allow(dead_code)]

use acs_gateway::gateway::GatewayConfig;
use acs_gateway::server::GatewayServer;
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use http_body_util::BodyExt;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const INDEX_HTML: &str = "<!doctype html><title>ACS dashboard</title>";

/// A request as the origin saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
struct OriginState {
    name: &'static str,
    log: Arc<Mutex<Vec<Captured>>>,
}

/// An axum server on an ephemeral port that records every request it
/// answers through its echo handler.
///
/// Fixed paths: `/api/teapot` answers `418`, `/api/slow` sleeps two
/// seconds, `/api/redirect` answers `302`. Everything else is echoed back
/// as `{"origin","method","uri","body_len"}`.
pub struct MockOrigin {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<Captured>>>,
}

impl MockOrigin {
    pub async fn start(name: &'static str) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/api/teapot",
                any(|| async {
                    (
                        StatusCode::IM_A_TEAPOT,
                        [("x-origin-error", "teapot")],
                        "short and stout",
                    )
                }),
            )
            .route(
                "/api/slow",
                any(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    "late"
                }),
            )
            .route(
                "/api/redirect",
                any(|| async { (StatusCode::FOUND, [(header::LOCATION, "/api/elsewhere")]) }),
            )
            .fallback(echo)
            .with_state(OriginState {
                name,
                log: Arc::clone(&log),
            });

        let addr = serve_on_ephemeral_port(app).await;
        Self { addr, log }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.log.lock().unwrap().clone()
    }

    pub fn hits(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn last(&self) -> Captured {
        self.requests().pop().expect("origin received no request")
    }
}

async fn echo(State(state): State<OriginState>, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let body = body.collect().await.unwrap().to_bytes();
    let captured = Captured {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts.headers,
        body,
    };
    let reply = json!({
        "origin": state.name,
        "method": captured.method,
        "uri": captured.uri,
        "body_len": captured.body.len(),
    });
    state.log.lock().unwrap().push(captured);
    Json(reply).into_response()
}

/// Origin whose `/api/stream` body is fed chunk by chunk through the
/// returned sender. Dropping the sender ends the body.
pub async fn streaming_origin() -> (SocketAddr, mpsc::Sender<Bytes>) {
    let (tx, rx) = mpsc::channel::<Bytes>(64);
    let rx = Arc::new(Mutex::new(Some(rx)));

    let app = Router::new()
        .route(
            "/api/stream",
            any(
                |State(rx): State<Arc<Mutex<Option<mpsc::Receiver<Bytes>>>>>| async move {
                    let rx = rx.lock().unwrap().take().expect("stream requested twice");
                    let stream = futures::stream::unfold(rx, |mut rx| async move {
                        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
                    });
                    (
                        [(header::CONTENT_TYPE, "text/event-stream")],
                        Body::from_stream(stream),
                    )
                },
            ),
        )
        .with_state(rx);

    (serve_on_ephemeral_port(app).await, tx)
}

async fn serve_on_ephemeral_port(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Build directory with an index document and one asset.
pub fn spa_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/main.js"), "import './app.js';").unwrap();
    dir
}

/// Core and device-UI origins plus a build directory.
pub async fn origins_and_spa() -> (MockOrigin, MockOrigin, tempfile::TempDir) {
    (
        MockOrigin::start("core").await,
        MockOrigin::start("ui").await,
        spa_dir(),
    )
}

pub fn config(core: &MockOrigin, ui: &MockOrigin, spa: &tempfile::TempDir) -> GatewayConfig {
    GatewayConfig::new(core.base_url(), ui.base_url()).with_static_dir(spa.path())
}

pub fn app(server: &GatewayServer) -> Router {
    server.build_app().unwrap()
}

pub async fn send(app: &Router, req: Request) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn body_bytes(resp: Response) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_string(resp: Response) -> String {
    String::from_utf8(body_bytes(resp).await.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}
