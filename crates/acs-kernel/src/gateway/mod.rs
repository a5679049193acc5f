//! Gateway kernel contract.
//!
//! This module defines the *route table, rewrite rules and configuration
//! types* for the ACS edge gateway. The runtime that acts on a
//! [`RouteMatch`] (proxying, in-process auth, static files) lives in
//! `acs-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              acs-kernel  (this module)                      │
//! │  GatewayConfig + validate()   RouteTable::resolve()         │
//! │  PathRewrite                  GatewayError                  │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              acs-gateway  (runtime crate)                   │
//! │  ProxyEngine (reqwest)   AuthHandler   LegacyGuard          │
//! │  StaticFallback (tower-http)   GatewayServer (axum)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use acs_kernel::gateway::{GatewayConfig, RouteTable, RouteTarget};
//!
//! let config = GatewayConfig::new("http://127.0.0.1:3000", "http://127.0.0.1:3001");
//! let table = RouteTable::from_config(&config).expect("valid gateway config");
//!
//! let m = table.resolve("/ui/devices");
//! assert!(matches!(m.target, RouteTarget::Proxy(_)));
//! assert_eq!(m.path, "/devices");
//! ```

pub mod error;
pub mod rewrite;
pub mod router;
pub mod validation;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use error::GatewayError;
pub use rewrite::{PathRewrite, replace_prefix, strip_prefix_default_root};
pub use router::{Origin, OriginId, PathPattern, RouteMatch, RouteRule, RouteTable, RouteTarget};
pub use validation::{AuthConfig, GatewayConfig, LegacyTunnelConfig};

/// Path prefix of the deprecated authentication tunnel.
pub const LEGACY_AUTH_PREFIX: &str = "/_legacy/auth";

/// Path under which the core backend serves its own auth endpoints.
pub const MODERN_AUTH_PREFIX: &str = "/api/auth";

/// Core backend API prefix.
pub const API_PREFIX: &str = "/api";

/// Device-management UI prefix.
pub const DEVICE_UI_PREFIX: &str = "/ui";
