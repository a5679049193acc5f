//! Path rewrite rules.
//!
//! Rewrites operate on the request *path only*. The query string is split off
//! before a rewrite runs and reattached verbatim by the proxy afterwards.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A pure `path -> path` transform attached to a [`RouteRule`](super::RouteRule).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathRewrite {
    /// Replace a leading `from` segment with `to`.
    ReplacePrefix { from: String, to: String },
    /// Drop a leading `prefix`, mapping an empty remainder to `/`.
    StripPrefixDefaultRoot { prefix: String },
}

impl PathRewrite {
    pub fn replace_prefix(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::ReplacePrefix {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn strip_prefix_default_root(prefix: impl Into<String>) -> Self {
        Self::StripPrefixDefaultRoot {
            prefix: prefix.into(),
        }
    }

    /// Apply the rewrite to `path`.
    pub fn apply<'a>(&self, path: &'a str) -> Cow<'a, str> {
        match self {
            PathRewrite::ReplacePrefix { from, to } => replace_prefix(path, from, to),
            PathRewrite::StripPrefixDefaultRoot { prefix } => {
                strip_prefix_default_root(path, prefix)
            }
        }
    }
}

/// Returns the part of `path` after `prefix` when `prefix` ends on a segment
/// boundary, i.e. `path == prefix` or `path` continues with `/`.
fn remainder<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// `/_legacy/auth/login` with `from = /_legacy/auth`, `to = /api/auth`
/// becomes `/api/auth/login`. Paths that do not start with `from` on a
/// segment boundary are returned untouched.
pub fn replace_prefix<'a>(path: &'a str, from: &str, to: &str) -> Cow<'a, str> {
    match remainder(path, from) {
        Some(rest) => Cow::Owned(format!("{to}{rest}")),
        None => Cow::Borrowed(path),
    }
}

/// `/ui` and `/ui/` become `/`, `/ui/devices` becomes `/devices`.
pub fn strip_prefix_default_root<'a>(path: &'a str, prefix: &str) -> Cow<'a, str> {
    match remainder(path, prefix) {
        Some("") => Cow::Borrowed("/"),
        Some(rest) => Cow::Borrowed(rest),
        None => Cow::Borrowed(path),
    }
}
