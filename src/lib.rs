//! Workspace placeholder crate.
//!
//! Re-exports the `core-service` façade behind the `desktop-shims` feature so
//! host applications (the HTTP layer) can depend on a single crate.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
