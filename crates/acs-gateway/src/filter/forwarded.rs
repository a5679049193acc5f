//! `x-forwarded-*` headers for proxied requests.

use axum::http::{HeaderMap, HeaderValue, header};
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Headers to merge into an outbound request.
///
/// The peer address is appended to any inbound `x-forwarded-for` chain.
/// `x-forwarded-host` and `x-forwarded-proto` are only filled in when an
/// upstream proxy has not already set them.
pub fn forwarded_headers(inbound: &HeaderMap, peer: Option<SocketAddr>) -> HeaderMap {
    let mut out = HeaderMap::new();

    let existing = inbound
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let chain = match (existing.is_empty(), peer) {
        (true, Some(peer)) => Some(peer.ip().to_string()),
        (false, Some(peer)) => Some(format!("{existing}, {}", peer.ip())),
        (false, None) => Some(existing),
        (true, None) => None,
    };
    if let Some(value) = chain.and_then(|c| HeaderValue::from_str(&c).ok()) {
        out.insert(X_FORWARDED_FOR, value);
    }

    if !inbound.contains_key(X_FORWARDED_HOST) {
        if let Some(host) = inbound.get(header::HOST) {
            out.insert(X_FORWARDED_HOST, host.clone());
        }
    }
    if !inbound.contains_key(X_FORWARDED_PROTO) {
        out.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
    }

    out
}
