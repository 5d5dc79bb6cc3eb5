//! # Repository Pattern Implementation
//!
//! Repository traits and implementations for data access.
//!
//! ## Architecture
//!
//! - Traits define the interface the synchronizer and the service depend on
//! - SQLite implementations use sqlx for async database access
//! - All operations return `Result<T>` for error handling
//! - Pagination is supported via the `Page<T>` wrapper
//!
//! ## Available Repositories
//!
//! - `TrackRepository` - Track catalog records

pub mod pagination;
pub mod track;

pub use pagination::{Page, PageRequest, MAX_PAGE_SIZE};
pub use track::{SqliteTrackRepository, TrackRepository};
