//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop/server platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `FileSystemAccess` using `tokio::fs`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::TokioFileSystem;
//! use bridge_traits::FileSystemAccess;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fs = TokioFileSystem::new();
//!     let entries = fs.list_directory(Path::new("/srv/music")).await?;
//! }
//! ```

mod filesystem;

pub use filesystem::TokioFileSystem;
