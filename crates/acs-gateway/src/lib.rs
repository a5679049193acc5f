//! `acs-gateway`: ACS dashboard edge gateway runtime.
//!
//! One listener in front of the dashboard stack. Requests are resolved
//! against the ordered route table from `acs-kernel::gateway` and sent to:
//!
//! | Target | Implementation |
//! |--------|----------------|
//! | auth subsystem (in-process) | [`auth::AuthRouter`] over an [`auth::AuthHandler`] |
//! | legacy auth tunnel | [`filter::LegacyGuard`] then [`backend::ProxyEngine`] |
//! | core backend, device UI, dev server | [`backend::ProxyEngine`] |
//! | compiled SPA | [`backend::StaticFallback`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use acs_gateway::server::GatewayServer;
//! use acs_kernel::gateway::{GatewayConfig, LegacyTunnelConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GatewayConfig::new("http://backend:3000", "http://genieacs-ui:3001")
//!         .with_static_dir("dist")
//!         .with_legacy_tunnel(LegacyTunnelConfig::enabled_with_token("s3cret"));
//!
//!     GatewayServer::new(config).start().await.unwrap();
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod filter;
pub mod server;

// Re-export the kernel gateway types for convenience.
pub use acs_kernel::gateway;
