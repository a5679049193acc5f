//! `acs-kernel`: pure contract types for the ACS edge gateway.
//!
//! Everything in this crate is computed from static configuration and the
//! request path alone. No sockets, no HTTP stack, no filesystem access: the
//! runtime lives in `acs-gateway`.

// gateway module
pub mod gateway;
