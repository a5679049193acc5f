//! Ordered route table.
//!
//! Routes are stored in declaration order. Resolution performs a linear scan
//! and the first structural match wins, which makes precedence an explicit,
//! testable property of the table rather than of the HTTP framework's
//! registration order. The table is built once from a validated
//! [`GatewayConfig`] and never mutated afterwards.

use super::error::GatewayError;
use super::rewrite::PathRewrite;
use super::validation::GatewayConfig;
use super::{API_PREFIX, DEVICE_UI_PREFIX, LEGACY_AUTH_PREFIX, MODERN_AUTH_PREFIX};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Origins
// ─────────────────────────────────────────────────────────────────────────────

/// Upstream services the gateway can forward to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OriginId {
    CoreApi,
    DeviceUi,
    DevServer,
}

impl OriginId {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginId::CoreApi => "core-api",
            OriginId::DeviceUi => "device-ui",
            OriginId::DevServer => "dev-server",
        }
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An origin and the base URL requests are joined onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub id: OriginId,
    /// Base URL without a trailing slash.
    pub base_url: String,
}

impl Origin {
    pub fn new(id: OriginId, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { id, base_url }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Structural path matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathPattern {
    /// Matches only this exact path.
    Exact(String),
    /// Matches the path itself and anything below it (`P` or `P/...`).
    Prefix(String),
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p,
            PathPattern::Prefix(p) => path
                .strip_prefix(p.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

/// What handles a matched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteTarget {
    /// In-process authentication handler; never rewritten, never proxied.
    Auth,
    /// Shared-secret guarded proxy to the given origin.
    LegacyTunnel(Origin),
    /// Plain proxy to the given origin.
    Proxy(Origin),
    /// Files from the static directory with index fallback.
    Static,
}

/// A single routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Stable identifier used in logs.
    pub id: String,
    pub pattern: PathPattern,
    pub target: RouteTarget,
    pub rewrite: Option<PathRewrite>,
}

impl RouteRule {
    pub fn new(id: impl Into<String>, pattern: PathPattern, target: RouteTarget) -> Self {
        Self {
            id: id.into(),
            pattern,
            target,
            rewrite: None,
        }
    }

    /// Builder: attach a path rewrite.
    pub fn with_rewrite(mut self, rewrite: PathRewrite) -> Self {
        self.rewrite = Some(rewrite);
        self
    }
}

/// The result of resolving a path against a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Id of the matched rule (or the fallback).
    pub rule_id: &'a str,
    pub target: &'a RouteTarget,
    /// Path after the rule's rewrite; query string not included.
    pub path: Cow<'a, str>,
}

// ─────────────────────────────────────────────────────────────────────────────
// RouteTable
// ─────────────────────────────────────────────────────────────────────────────

/// Rule id reported when no rule matched.
pub const FALLBACK_RULE_ID: &str = "spa-fallback";

/// Ordered rule list plus a terminal fallback target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
    fallback: RouteTarget,
}

impl RouteTable {
    /// Build a table from explicit rules. `fallback` handles every path no
    /// rule matches.
    pub fn new(rules: Vec<RouteRule>, fallback: RouteTarget) -> Self {
        Self { rules, fallback }
    }

    /// Build the gateway's fixed-precedence table from `config`.
    ///
    /// Precedence, highest first:
    /// 1. auth base path (exact)
    /// 2. auth base path subtree
    /// 3. `/_legacy/auth` subtree, only when the tunnel is enabled
    /// 4. `/api` subtree
    /// 5. `/ui` (exact) and `/ui` subtree
    /// 6. fallback: dev server when configured, static files otherwise
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;

        let auth_path = config.auth.normalized_base_path().to_string();
        let core_api = Origin::new(OriginId::CoreApi, &config.core_api_url);
        let device_ui = Origin::new(OriginId::DeviceUi, &config.device_ui_url);
        let ui_rewrite = PathRewrite::strip_prefix_default_root(DEVICE_UI_PREFIX);

        let mut rules = vec![
            RouteRule::new("auth", PathPattern::Exact(auth_path.clone()), RouteTarget::Auth),
            RouteRule::new("auth-subtree", PathPattern::Prefix(auth_path), RouteTarget::Auth),
        ];
        if config.legacy_tunnel.enabled {
            rules.push(
                RouteRule::new(
                    "legacy-auth",
                    PathPattern::Prefix(LEGACY_AUTH_PREFIX.to_string()),
                    RouteTarget::LegacyTunnel(core_api.clone()),
                )
                .with_rewrite(PathRewrite::replace_prefix(
                    LEGACY_AUTH_PREFIX,
                    MODERN_AUTH_PREFIX,
                )),
            );
        }
        rules.push(RouteRule::new(
            "core-api",
            PathPattern::Prefix(API_PREFIX.to_string()),
            RouteTarget::Proxy(core_api),
        ));
        rules.push(
            RouteRule::new(
                "device-ui",
                PathPattern::Exact(DEVICE_UI_PREFIX.to_string()),
                RouteTarget::Proxy(device_ui.clone()),
            )
            .with_rewrite(ui_rewrite.clone()),
        );
        rules.push(
            RouteRule::new(
                "device-ui-subtree",
                PathPattern::Prefix(DEVICE_UI_PREFIX.to_string()),
                RouteTarget::Proxy(device_ui),
            )
            .with_rewrite(ui_rewrite),
        );

        let fallback = match &config.dev_proxy_url {
            Some(url) => RouteTarget::Proxy(Origin::new(OriginId::DevServer, url)),
            None => RouteTarget::Static,
        };

        Ok(Self::new(rules, fallback))
    }

    /// Resolve `path` (no query string) to the first matching rule.
    ///
    /// Always succeeds: paths no rule claims resolve to the fallback target
    /// with the path unchanged.
    pub fn resolve<'a>(&'a self, path: &'a str) -> RouteMatch<'a> {
        for rule in &self.rules {
            if rule.pattern.matches(path) {
                let path = match &rule.rewrite {
                    Some(rewrite) => rewrite.apply(path),
                    None => Cow::Borrowed(path),
                };
                return RouteMatch {
                    rule_id: &rule.id,
                    target: &rule.target,
                    path,
                };
            }
        }
        RouteMatch {
            rule_id: FALLBACK_RULE_ID,
            target: &self.fallback,
            path: Cow::Borrowed(path),
        }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn fallback(&self) -> &RouteTarget {
        &self.fallback
    }

    /// Every origin a rule (or the fallback) may proxy to.
    pub fn origins(&self) -> impl Iterator<Item = &Origin> {
        self.rules
            .iter()
            .map(|r| &r.target)
            .chain(std::iter::once(&self.fallback))
            .filter_map(|t| match t {
                RouteTarget::Proxy(o) | RouteTarget::LegacyTunnel(o) => Some(o),
                RouteTarget::Auth | RouteTarget::Static => None,
            })
    }
}

// =============================================================================
// Tests
// =============================================================================
