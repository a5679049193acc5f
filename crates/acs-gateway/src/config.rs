//! Environment configuration.
//!
//! The gateway reads its configuration exactly once at startup. Empty
//! variables count as unset.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_HOST` | `0.0.0.0` | Listen host. |
//! | `GATEWAY_PORT` | `8080` | Listen port. |
//! | `CORE_API_URL` | *(required)* | Core backend origin. |
//! | `DEVICE_UI_URL` | *(required)* | Device-management UI origin. |
//! | `DEV_PROXY_URL` | *(none)* | Frontend dev server; replaces static serving. |
//! | `STATIC_DIR` | `dist` | Compiled SPA directory. |
//! | `LEGACY_AUTH_TUNNEL` | `false` | Enable the `/_legacy/auth` tunnel. |
//! | `LEGACY_AUTH_HEADER` | `x-legacy-auth` | Tunnel guard header. |
//! | `LEGACY_AUTH_TOKEN` | *(none)* | Tunnel guard token. |
//! | `AUTH_BASE_PATH` | `/api/auth` | Path subtree owned by the auth subsystem. |
//! | `AUTH_BASE_URL` | *(none)* | Public URL override for the auth subsystem. |
//! | `AUTH_TRUSTED_ORIGINS` | *(none)* | Comma-separated trusted browser origins. |
//! | `UPSTREAM_TIMEOUT_MS` | `30000` | Max wait for origin response headers. |
//! | `MAX_BODY_BYTES` | `104857600` | Max buffered request body. |

use crate::error::StartupError;
use acs_kernel::gateway::{AuthConfig, GatewayConfig, LegacyTunnelConfig};
use std::str::FromStr;

pub const GATEWAY_HOST: &str = "GATEWAY_HOST";
pub const GATEWAY_PORT: &str = "GATEWAY_PORT";
pub const CORE_API_URL: &str = "CORE_API_URL";
pub const DEVICE_UI_URL: &str = "DEVICE_UI_URL";
pub const DEV_PROXY_URL: &str = "DEV_PROXY_URL";
pub const STATIC_DIR: &str = "STATIC_DIR";
pub const LEGACY_AUTH_TUNNEL: &str = "LEGACY_AUTH_TUNNEL";
pub const LEGACY_AUTH_HEADER: &str = "LEGACY_AUTH_HEADER";
pub const LEGACY_AUTH_TOKEN: &str = "LEGACY_AUTH_TOKEN";
pub const AUTH_BASE_PATH: &str = "AUTH_BASE_PATH";
pub const AUTH_BASE_URL: &str = "AUTH_BASE_URL";
pub const AUTH_TRUSTED_ORIGINS: &str = "AUTH_TRUSTED_ORIGINS";
pub const UPSTREAM_TIMEOUT_MS: &str = "UPSTREAM_TIMEOUT_MS";
pub const MAX_BODY_BYTES: &str = "MAX_BODY_BYTES";

/// Load and validate the configuration from the process environment.
pub fn load_config() -> Result<GatewayConfig, StartupError> {
    load_config_from(|name| std::env::var(name).ok())
}

/// Load and validate the configuration from an arbitrary variable lookup.
pub fn load_config_from<F>(lookup: F) -> Result<GatewayConfig, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| {
        lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let core_api_url = var(CORE_API_URL).unwrap_or_default();
    let device_ui_url = var(DEVICE_UI_URL).unwrap_or_default();
    let mut config = GatewayConfig::new(core_api_url, device_ui_url);

    if let Some(host) = var(GATEWAY_HOST) {
        config.host = host;
    }
    if let Some(port) = var(GATEWAY_PORT) {
        config.port = parse(GATEWAY_PORT, &port)?;
    }
    config.dev_proxy_url = var(DEV_PROXY_URL);
    if let Some(dir) = var(STATIC_DIR) {
        config.static_dir = dir.into();
    }

    let defaults = LegacyTunnelConfig::default();
    config.legacy_tunnel = LegacyTunnelConfig {
        enabled: match var(LEGACY_AUTH_TUNNEL) {
            Some(flag) => parse_flag(LEGACY_AUTH_TUNNEL, &flag)?,
            None => false,
        },
        header_name: var(LEGACY_AUTH_HEADER)
            .map(|h| h.to_ascii_lowercase())
            .unwrap_or(defaults.header_name),
        token: var(LEGACY_AUTH_TOKEN),
    };

    config.auth = AuthConfig {
        base_path: var(AUTH_BASE_PATH).unwrap_or_else(|| AuthConfig::default().base_path),
        base_url: var(AUTH_BASE_URL),
        trusted_origins: var(AUTH_TRUSTED_ORIGINS)
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    };

    if let Some(ms) = var(UPSTREAM_TIMEOUT_MS) {
        config.upstream_timeout_ms = parse(UPSTREAM_TIMEOUT_MS, &ms)?;
    }
    if let Some(bytes) = var(MAX_BODY_BYTES) {
        config.max_body_bytes = parse(MAX_BODY_BYTES, &bytes)?;
    }

    config.validate()?;
    Ok(config)
}

fn parse<T>(name: &str, value: &str) -> Result<T, StartupError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| StartupError::InvalidEnv {
        name: name.to_string(),
        reason: format!("'{value}': {e}"),
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, StartupError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(StartupError::InvalidEnv {
            name: name.to_string(),
            reason: format!("'{value}' is not a boolean"),
        }),
    }
}
