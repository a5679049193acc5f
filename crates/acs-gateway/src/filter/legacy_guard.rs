//! Shared-secret guard for the legacy auth tunnel.
//!
//! When a token is configured, the request must carry the guard header with
//! exactly that value. Anything else is answered with `403` and
//! `{"error":"forbidden"}` before the request reaches an origin.

use crate::error::StartupError;
use acs_kernel::gateway::LegacyTunnelConfig;
use axum::{
    Json,
    http::{HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use subtle::ConstantTimeEq;
use tracing::debug;

/// Header check guarding the legacy tunnel.
#[derive(Clone)]
pub struct LegacyGuard {
    header: HeaderName,
    token: Option<String>,
}

impl std::fmt::Debug for LegacyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyGuard")
            .field("header", &self.header)
            .field("enforced", &self.is_enforced())
            .finish()
    }
}

impl LegacyGuard {
    pub fn from_config(config: &LegacyTunnelConfig) -> Result<Self, StartupError> {
        let header = HeaderName::from_bytes(config.header_name.as_bytes()).map_err(|e| {
            StartupError::InvalidHeader(config.header_name.clone(), e.to_string())
        })?;
        Ok(Self {
            header,
            token: config.guard_token().map(str::to_string),
        })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// `false` when no token is configured and every caller passes.
    pub fn is_enforced(&self) -> bool {
        self.token.is_some()
    }

    pub fn check(&self, headers: &HeaderMap) -> Result<(), GuardRejection> {
        let Some(expected) = &self.token else {
            return Ok(());
        };
        let presented = headers.get(&self.header).map(|v| v.as_bytes());
        match presented {
            Some(value) if bool::from(value.ct_eq(expected.as_bytes())) => Ok(()),
            Some(_) => {
                debug!(header = %self.header, "legacy tunnel rejected: token mismatch");
                Err(GuardRejection)
            }
            None => {
                debug!(header = %self.header, "legacy tunnel rejected: header missing");
                Err(GuardRejection)
            }
        }
    }
}

/// Guard failure. Client-caused; not a gateway fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardRejection;

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" }))).into_response()
    }
}
