//! Backend module.

mod proxy;
mod static_files;

pub use proxy::{ProxiedRequest, ProxyEngine};
pub use static_files::{INDEX_FILE, StaticFallback};
