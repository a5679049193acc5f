//! ACS edge gateway entry point.
//!
//! Reads configuration from environment variables (see [`acs_gateway::config`])
//! and starts the gateway. No auth subsystem is linked into this binary, so
//! auth paths answer `503` unless the gateway is embedded as a library.

use acs_gateway::config::load_config;
use acs_gateway::server::GatewayServer;
use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("acs_gateway=info,tower_http=info")),
        )
        .init();

    let config = load_config().wrap_err("invalid gateway configuration")?;

    info!(
        listen = %config.listen_addr(),
        core_api = %config.core_api_url,
        device_ui = %config.device_ui_url,
        dev_proxy = config.dev_proxy_url.as_deref().unwrap_or("-"),
        static_dir = %config.static_dir.display(),
        auth_base_path = %config.auth.base_path,
        auth_base_url = config.auth.base_url.as_deref().unwrap_or("-"),
        trusted_origins = config.auth.trusted_origins.len(),
        legacy_tunnel = config.legacy_tunnel.enabled,
        timeout_ms = config.upstream_timeout_ms,
        "ACS edge gateway configuration loaded"
    );

    GatewayServer::new(config)
        .start()
        .await
        .wrap_err("gateway stopped")
}
