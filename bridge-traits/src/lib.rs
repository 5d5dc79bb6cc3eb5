//! # Host Bridge Traits
//!
//! Capability traits the library core requires from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and the
//! platform-specific implementations. The core never touches `std::fs` or a
//! logging backend directly; it goes through these traits so passes can run
//! against test doubles.
//!
//! ## Traits
//!
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Directory listing, stat, existence checks
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to the host logger
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Keep the original `std::io::Error` when one exists, so callers can tell a
//!   missing path from a permission problem
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent usage
//! across async tasks.

pub mod error;
pub mod logging;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::{FileMetadata, FileSystemAccess};
