//! Gateway error types

use acs_kernel::gateway::{GatewayError, OriginId};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Request-time failures owned by the gateway itself.
///
/// An origin answering with a 4xx/5xx is *not* one of these: that response
/// is relayed untouched.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("origin '{origin}' is unreachable: {source}")]
    Unreachable {
        origin: OriginId,
        #[source]
        source: reqwest::Error,
    },

    #[error("origin '{origin}' did not respond within {after_ms} ms")]
    Timeout { origin: OriginId, after_ms: u64 },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ProxyError::Unreachable { .. } => (StatusCode::BAD_GATEWAY, "ORIGIN_UNREACHABLE"),
            ProxyError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "ORIGIN_TIMEOUT"),
            ProxyError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE")
            }
            ProxyError::BodyRead(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST_BODY"),
            ProxyError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ProxyResult<T> = Result<T, ProxyError>;

/// Failures that stop the gateway from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] GatewayError),

    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: String, reason: String },

    #[error("invalid header value '{0}': {1}")]
    InvalidHeader(String, String),

    #[error("static directory '{}' does not exist", .0.display())]
    StaticDirMissing(PathBuf),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
