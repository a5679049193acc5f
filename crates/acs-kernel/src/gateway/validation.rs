//! Gateway configuration container and startup validation.
//!
//! [`GatewayConfig`] aggregates everything the edge gateway needs to know
//! about its environment and exposes a single [`validate()`] method that
//! checks all structural invariants *before* any socket is bound. The value
//! is immutable once the gateway has started.
//!
//! [`validate()`]: GatewayConfig::validate

use super::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// AuthConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Settings handed to the in-process authentication subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Path subtree owned by the auth subsystem, e.g. `/api/auth`.
    pub base_path: String,
    /// Public URL override for the auth subsystem (callback / cookie domain).
    pub base_url: Option<String>,
    /// Browser origins allowed to make credentialed calls to the auth subtree.
    pub trusted_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_path: "/api/auth".to_string(),
            base_url: None,
            trusted_origins: Vec::new(),
        }
    }
}

impl AuthConfig {
    /// `base_path` without trailing slashes.
    pub fn normalized_base_path(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }

    fn validate(&self) -> Result<(), GatewayError> {
        let path = self.normalized_base_path();
        if path.is_empty() {
            return Err(GatewayError::InvalidAuthBasePath(
                self.base_path.clone(),
                "auth base path cannot be empty or '/'".to_string(),
            ));
        }
        if !path.starts_with('/') {
            return Err(GatewayError::InvalidAuthBasePath(
                self.base_path.clone(),
                "auth base path must start with '/'".to_string(),
            ));
        }
        if path.contains(['?', '#']) || path.chars().any(char::is_whitespace) {
            return Err(GatewayError::InvalidAuthBasePath(
                self.base_path.clone(),
                "auth base path must be a plain path".to_string(),
            ));
        }
        if let Some(url) = &self.base_url {
            check_http_url(url).map_err(|_| GatewayError::InvalidAuthBaseUrl(url.clone()))?;
        }
        for origin in &self.trusted_origins {
            check_http_url(origin)
                .map_err(|_| GatewayError::InvalidTrustedOrigin(origin.clone()))?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LegacyTunnelConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Deprecated shared-secret auth tunnel settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTunnelConfig {
    /// When `false` the tunnel route is not part of the route table at all.
    pub enabled: bool,
    /// Header carrying the shared secret.
    pub header_name: String,
    /// Expected header value. `None` or empty disables the guard check.
    pub token: Option<String>,
}

impl Default for LegacyTunnelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            header_name: "x-legacy-auth".to_string(),
            token: None,
        }
    }
}

impl LegacyTunnelConfig {
    /// Enabled tunnel guarded by `token` in the default header.
    pub fn enabled_with_token(token: impl Into<String>) -> Self {
        Self {
            enabled: true,
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// The token the guard compares against, if the guard is active.
    pub fn guard_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if !self.enabled {
            return Ok(());
        }
        let valid = !self.header_name.is_empty()
            && self.header_name.bytes().all(is_header_token_byte);
        if !valid {
            return Err(GatewayError::InvalidLegacyHeader(self.header_name.clone()));
        }
        Ok(())
    }
}

// RFC 9110 `tchar`.
fn is_header_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level gateway configuration.
///
/// Call [`validate()`](Self::validate) before handing the config to the
/// runtime; [`RouteTable::from_config`](super::RouteTable::from_config) does
/// so implicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen host (default `0.0.0.0`).
    pub host: String,
    /// Listen port (default `8080`).
    pub port: u16,
    /// Core backend API origin.
    pub core_api_url: String,
    /// Device-management UI origin.
    pub device_ui_url: String,
    /// Frontend dev server. When set, it replaces static file serving.
    pub dev_proxy_url: Option<String>,
    /// Compiled SPA directory.
    pub static_dir: PathBuf,
    /// In-process auth subsystem settings.
    pub auth: AuthConfig,
    /// Legacy auth tunnel settings.
    pub legacy_tunnel: LegacyTunnelConfig,
    /// How long to wait for an origin's response headers.
    pub upstream_timeout_ms: u64,
    /// Largest request body buffered for forwarding.
    pub max_body_bytes: usize,
}

impl GatewayConfig {
    /// Construct a config with the two required origins and defaults
    /// everywhere else.
    pub fn new(core_api_url: impl Into<String>, device_ui_url: impl Into<String>) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            core_api_url: core_api_url.into(),
            device_ui_url: device_ui_url.into(),
            dev_proxy_url: None,
            static_dir: PathBuf::from("dist"),
            auth: AuthConfig::default(),
            legacy_tunnel: LegacyTunnelConfig::default(),
            upstream_timeout_ms: 30_000,
            max_body_bytes: 100 * 1024 * 1024,
        }
    }

    pub fn with_listen(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    pub fn with_dev_proxy(mut self, url: impl Into<String>) -> Self {
        self.dev_proxy_url = Some(url.into());
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_legacy_tunnel(mut self, legacy: LegacyTunnelConfig) -> Self {
        self.legacy_tunnel = legacy;
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.upstream_timeout_ms = ms;
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// `host:port` suitable for binding.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate all structural invariants of this configuration.
    ///
    /// Returns the *first* detected [`GatewayError`]. Checks performed (in
    /// order):
    /// 1. Listen host is non-empty.
    /// 2. Core API and device UI origins are set and are http(s) URLs.
    /// 3. The dev-proxy origin, if set, is an http(s) URL.
    /// 4. A static directory is set when there is no dev proxy.
    /// 5. Auth base path, base URL and trusted origins are well formed.
    /// 6. An enabled legacy tunnel names a valid header.
    /// 7. Timeout and body limit are non-zero.
    pub fn validate(&self) -> Result<(), GatewayError> {
        // ── 1. Listener ──────────────────────────────────────────────────────
        if self.host.trim().is_empty() {
            return Err(GatewayError::EmptyHost);
        }

        // ── 2 + 3. Origins ───────────────────────────────────────────────────
        check_origin("core-api", &self.core_api_url)?;
        check_origin("device-ui", &self.device_ui_url)?;
        if let Some(dev) = &self.dev_proxy_url {
            check_origin("dev-server", dev)?;
        }

        // ── 4. Static assets ─────────────────────────────────────────────────
        if self.dev_proxy_url.is_none() && self.static_dir.as_os_str().is_empty() {
            return Err(GatewayError::MissingStaticDir);
        }

        // ── 5. Auth ──────────────────────────────────────────────────────────
        self.auth.validate()?;

        // ── 6. Legacy tunnel ─────────────────────────────────────────────────
        self.legacy_tunnel.validate()?;

        // ── 7. Limits ────────────────────────────────────────────────────────
        if self.upstream_timeout_ms == 0 {
            return Err(GatewayError::InvalidTimeout);
        }
        if self.max_body_bytes == 0 {
            return Err(GatewayError::InvalidBodyLimit);
        }

        Ok(())
    }
}

fn check_origin(name: &str, url: &str) -> Result<(), GatewayError> {
    if url.trim().is_empty() {
        return Err(GatewayError::MissingOrigin(name.to_string()));
    }
    check_http_url(url).map_err(|reason| GatewayError::InvalidOrigin(name.to_string(), reason))
}

fn check_http_url(url: &str) -> Result<(), String> {
    let parsed = Url::parse(url).map_err(|e| format!("'{url}' is not a valid URL: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("'{url}' has unsupported scheme '{other}'")),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(format!("'{url}' has no host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(format!("'{url}' must not carry a query or fragment"));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
