//! Streaming reverse-proxy engine.
//!
//! [`ProxyEngine`] forwards a [`ProxiedRequest`] to an origin and relays the
//! origin's response back: status and headers verbatim, body streamed chunk
//! by chunk as it arrives. The proxy is transparent: it never parses or
//! rewrites origin payloads, including error responses.
//!
//! Request bodies are buffered (bounded by the configured limit) and sent as
//! a single payload; response bodies are never buffered.

use crate::error::{ProxyError, ProxyResult, StartupError};
use acs_kernel::gateway::Origin;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, Method, header},
    response::Response,
};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use reqwest::{Client, redirect};
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Inbound headers never copied to the outbound request.
///
/// `host` is recomputed from the target authority; `content-length` and
/// `transfer-encoding` from the re-framed body.
const STRIPPED_REQUEST_HEADERS: [header::HeaderName; 3] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
];

// ─────────────────────────────────────────────────────────────────────────────
// ProxiedRequest
// ─────────────────────────────────────────────────────────────────────────────

/// A request ready to be forwarded. Consumed by [`ProxyEngine::forward`].
#[derive(Debug)]
pub struct ProxiedRequest {
    pub method: Method,
    /// Rewritten path, without query string.
    pub path: String,
    /// Original query string, untouched by any rewrite.
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Always `None` for `GET` and `HEAD`.
    pub body: Option<Bytes>,
}

impl ProxiedRequest {
    /// Build from an inbound request, forwarding it under `path`.
    ///
    /// `GET`/`HEAD` bodies are discarded unread. Other bodies are read in
    /// full, failing with [`ProxyError::PayloadTooLarge`] past `max_body`.
    pub async fn from_request(
        req: Request,
        path: impl Into<String>,
        max_body: usize,
    ) -> ProxyResult<Self> {
        let (parts, body) = req.into_parts();
        let body = if parts.method == Method::GET || parts.method == Method::HEAD {
            None
        } else {
            Some(read_body(body, max_body).await?)
        };

        Ok(Self {
            method: parts.method,
            path: path.into(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        })
    }

    /// `{base_url}{path}[?{query}]`.
    pub fn target_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match &self.query {
            Some(q) => format!("{base}{}?{q}", self.path),
            None => format!("{base}{}", self.path),
        }
    }

    /// Inbound headers minus the stripped set, with `extra` merged on top.
    pub fn outbound_headers(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = self.headers.clone();
        for name in &STRIPPED_REQUEST_HEADERS {
            headers.remove(name);
        }
        for name in extra.keys() {
            headers.remove(name);
        }
        for (name, value) in extra {
            headers.append(name, value.clone());
        }
        headers
    }
}

async fn read_body(body: Body, limit: usize) -> ProxyResult<Bytes> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ProxyError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ProxyError::BodyRead(e.to_string())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProxyEngine
// ─────────────────────────────────────────────────────────────────────────────

/// Forwards requests to origins over a shared connection pool.
#[derive(Clone)]
pub struct ProxyEngine {
    client: Client,
    timeout: Duration,
}

impl ProxyEngine {
    /// `timeout` bounds the wait for an origin's response headers; the body
    /// stream that follows is not time-limited.
    pub fn new(timeout: Duration) -> Result<Self, StartupError> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .map_err(StartupError::HttpClient)?;

        Ok(Self { client, timeout })
    }

    /// Forward `req` to `origin` and return the origin's response with a
    /// streaming body.
    ///
    /// `extra_headers` (e.g. `x-forwarded-*`) replace inbound headers of the
    /// same name. No retries are attempted.
    #[instrument(
        skip(self, req, extra_headers),
        fields(origin = %origin.id, method = %req.method, path = %req.path)
    )]
    pub async fn forward(
        &self,
        origin: &Origin,
        req: ProxiedRequest,
        extra_headers: &HeaderMap,
    ) -> ProxyResult<Response> {
        let url = req.target_url(&origin.base_url);
        debug!(url = %url, "forwarding to origin");

        let headers = req.outbound_headers(extra_headers);
        let mut builder = self.client.request(req.method, &url).headers(headers);
        if let Some(body) = req.body {
            builder = builder.body(body);
        }

        let start = Instant::now();
        let upstream = match tokio::time::timeout(self.timeout, builder.send()).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) if e.is_timeout() => {
                warn!(error = %e, "origin connect timed out");
                return Err(ProxyError::Timeout {
                    origin: origin.id,
                    after_ms: elapsed_ms(start),
                });
            }
            Ok(Err(e)) => {
                error!(error = %e, "origin unreachable");
                return Err(ProxyError::Unreachable {
                    origin: origin.id,
                    source: e,
                });
            }
            Err(_) => {
                warn!(
                    timeout_ms = elapsed_ms(start),
                    "origin did not send response headers in time"
                );
                return Err(ProxyError::Timeout {
                    origin: origin.id,
                    after_ms: duration_ms(self.timeout),
                });
            }
        };

        debug!(
            status = upstream.status().as_u16(),
            latency_ms = elapsed_ms(start),
            "origin responded"
        );

        let mut response = Response::builder().status(upstream.status());
        for (name, value) in upstream.headers() {
            response = response.header(name, value);
        }

        response
            .body(Body::from_stream(upstream.bytes_stream()))
            .map_err(|e| ProxyError::Internal(e.to_string()))
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn elapsed_ms(start: Instant) -> u64 {
    duration_ms(start.elapsed())
}
