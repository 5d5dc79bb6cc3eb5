//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the music library core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! Every other core crate logs through `tracing`; this crate decides where
//! those events end up and validates the settings the service starts with.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
