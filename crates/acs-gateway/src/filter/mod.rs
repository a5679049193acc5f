//! Filter module.
//!
//! Request-side checks and header computations applied by the dispatcher
//! before a request is handed to the proxy engine.

mod forwarded;
mod legacy_guard;

pub use forwarded::forwarded_headers;
pub use legacy_guard::{GuardRejection, LegacyGuard};
