//! # Library Management Module
//!
//! Owns the track catalog database and provides the repository the library
//! synchronizer reconciles against.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite database schema and migrations
//! - The `Track` record and its validation rules
//! - The `TrackRepository` contract (set-membership lookup, scoped listing,
//!   insert, update, batch delete) and its SQLite implementation
//! - Paginated, title-ordered listing for the HTTP layer

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{LibraryError, Result};
pub use models::{NewTrack, Track, UNKNOWN_ARTIST};
