use bridge_traits::BridgeError;
use core_library::LibraryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Sync already in progress for {}", .directory.display())]
    SyncInProgress { directory: PathBuf },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("File system error: {0}")]
    Bridge(#[from] BridgeError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
