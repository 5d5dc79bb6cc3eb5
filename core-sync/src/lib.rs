//! # Sync & Indexing Module
//!
//! Reconciles a directory of audio files with the track catalog.
//!
//! ## Overview
//!
//! A sync pass:
//! - Lists the directory (optionally recursively) through `FileSystemAccess`
//! - Filters audio files by extension
//! - Resolves title and artist from tags, file names and directory names
//! - Creates new records, corrects existing ones and collapses duplicates
//! - Prunes records whose files disappeared from the scanned directory
//!
//! ## Components
//!
//! - **Paths** (`paths`): Lexical normalization, candidate path forms, containment checks
//! - **Filter** (`filter`): Audio extension allow-list
//! - **Synchronizer** (`synchronizer`): The pass itself, with a per-directory single-flight gate

pub mod error;
pub mod filter;
pub mod paths;
pub mod synchronizer;

pub use error::{Result, SyncError};
pub use filter::{AudioExtensions, DEFAULT_AUDIO_EXTENSIONS};
pub use paths::{is_within, normalize_path, resolve_scan_root, CandidatePaths};
pub use synchronizer::{LibrarySynchronizer, SyncConfig, SyncSummary};
