//! Gateway error types for `acs-kernel`.
//!
//! [`GatewayError`] covers failures detectable at *startup*, before the
//! listener is bound. Request-time failures (connection refused, origin
//! timeout) belong in the runtime crate (`acs-gateway`).

use thiserror::Error;

/// Configuration error type for the gateway kernel contract.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Listener ─────────────────────────────────────────────────────────────
    /// The listen host is empty or whitespace-only.
    #[error("listen host cannot be empty")]
    EmptyHost,

    // ── Origins ──────────────────────────────────────────────────────────────
    /// A required origin URL was not configured.
    #[error("origin '{0}' is not configured")]
    MissingOrigin(String),

    /// An origin URL is syntactically invalid.
    #[error("origin '{0}' has an invalid URL: {1}")]
    InvalidOrigin(String, String),

    // ── Static assets ────────────────────────────────────────────────────────
    /// Neither a dev-proxy origin nor a static directory was configured.
    #[error("static directory must be set when no dev proxy is configured")]
    MissingStaticDir,

    // ── Auth ─────────────────────────────────────────────────────────────────
    /// The auth base path is unusable as a route prefix.
    #[error("auth base path '{0}' is invalid: {1}")]
    InvalidAuthBasePath(String, String),

    /// The auth base URL override is not an absolute http(s) URL.
    #[error("auth base URL '{0}' is invalid")]
    InvalidAuthBaseUrl(String),

    /// A trusted origin entry is not an absolute http(s) origin.
    #[error("trusted origin '{0}' is invalid")]
    InvalidTrustedOrigin(String),

    // ── Legacy tunnel ────────────────────────────────────────────────────────
    /// The legacy guard header name is empty or not a valid HTTP token.
    #[error("legacy auth header name '{0}' is not a valid header name")]
    InvalidLegacyHeader(String),

    // ── Limits ───────────────────────────────────────────────────────────────
    /// `upstream_timeout_ms` is zero, which would fail every proxied request.
    #[error("upstream timeout must be greater than 0 ms")]
    InvalidTimeout,

    /// `max_body_bytes` is zero, which would reject every request body.
    #[error("maximum request body size must be greater than 0 bytes")]
    InvalidBodyLimit,
}
