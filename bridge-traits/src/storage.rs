//! File System Abstractions
//!
//! Provides the platform-agnostic file system contract the library scanner
//! depends on: directory listing, stat and existence checks.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File metadata information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
    /// True only for regular files (not directories, sockets, devices, ...)
    pub is_file: bool,
}

impl FileMetadata {
    /// Metadata describing a regular file of the given size.
    pub fn file(size: u64) -> Self {
        Self {
            size,
            created_at: None,
            modified_at: None,
            is_directory: false,
            is_file: true,
        }
    }

    /// Metadata describing a directory.
    pub fn directory() -> Self {
        Self {
            size: 0,
            created_at: None,
            modified_at: None,
            is_directory: true,
            is_file: false,
        }
    }
}

/// File system access trait
///
/// Abstracts the file system reads performed by the library scanner so the
/// synchronization pass can run against the real disk (desktop) or a test
/// double.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn count_entries(fs: &dyn FileSystemAccess, dir: &Path) -> Result<usize> {
///     Ok(fs.list_directory(dir).await?.len())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory, following symlinks
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// List the immediate entries of a directory (not recursive)
    ///
    /// Returned paths are `path` joined with each entry name.
    ///
    /// # Errors
    ///
    /// Fails if the path is missing or is not a directory.
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Resolve `path` to its canonical form, following symlinks
    ///
    /// Used to recognize a directory reached twice through links. The
    /// default returns the path unchanged, for backends without links.
    async fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}
