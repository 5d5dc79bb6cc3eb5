//! # Core Configuration Module
//!
//! Provides configuration management for the music library core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all settings and host capabilities the core needs. It
//! enforces fail-fast validation so a misconfigured server refuses to start
//! instead of failing on the first import.
//!
//! ## Required Settings
//!
//! - `database_path` - SQLite catalog file
//! - `library_dir` - Root of the music library; relative import directories
//!   resolve against it
//!
//! ## Optional Settings (with defaults)
//!
//! - `audio_extensions` - Defaults to `.mp3 .flac .m4a .aac .wav .ogg`
//! - `recursive` - Walk subdirectories during import (default: off)
//! - `FileSystemAccess` - File I/O (desktop default: tokio fs)
//!
//! When the `desktop-shims` feature is enabled, a `TokioFileSystem` is
//! injected automatically if no file system bridge is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/var/lib/music/library.db")
//!     .library_dir("/srv/music")
//!     .audio_extensions(["mp3", "flac"])
//!     .build()?;
//! ```
//!
//! Or from the process environment:
//!
//! ```ignore
//! let config = CoreConfig::from_env()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::FileSystemAccess;
use std::path::PathBuf;
use std::sync::Arc;

/// Extensions imported when none are configured.
pub const DEFAULT_AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "flac", "m4a", "aac", "wav", "ogg"];

/// Default catalog file when `MUSIC_DATABASE_PATH` is unset
pub const DEFAULT_DATABASE_PATH: &str = "music-library.db";

/// Default library directory when `MUSIC_LIBRARY_DIR` is unset
pub const DEFAULT_LIBRARY_DIR: &str = "Music";

pub const ENV_DATABASE_PATH: &str = "MUSIC_DATABASE_PATH";
pub const ENV_LIBRARY_DIR: &str = "MUSIC_LIBRARY_DIR";
pub const ENV_AUDIO_EXTENSIONS: &str = "MUSIC_AUDIO_EXTENSIONS";
pub const ENV_SCAN_RECURSIVE: &str = "MUSIC_SCAN_RECURSIVE";

/// Core configuration for the music library.
///
/// Use [`CoreConfigBuilder`] or [`CoreConfig::from_env`] to construct
/// instances. Paths are absolute once built.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Library root directory
    pub library_dir: PathBuf,

    /// Allowed audio extensions, lowercase without dots
    pub audio_extensions: Vec<String>,

    /// Walk subdirectories during import
    pub recursive: bool,

    /// File system access abstraction
    pub file_system: Arc<dyn FileSystemAccess>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("library_dir", &self.library_dir)
            .field("audio_extensions", &self.audio_extensions)
            .field("recursive", &self.recursive)
            .field("file_system", &"FileSystemAccess { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Build a configuration from the process environment.
    ///
    /// | variable                 | meaning                               | default            |
    /// |--------------------------|---------------------------------------|--------------------|
    /// | `MUSIC_DATABASE_PATH`    | SQLite catalog file                   | `music-library.db` |
    /// | `MUSIC_LIBRARY_DIR`      | library root                          | `Music`            |
    /// | `MUSIC_AUDIO_EXTENSIONS` | comma-separated extension list        | built-in list      |
    /// | `MUSIC_SCAN_RECURSIVE`   | `true`/`false` (also `1`/`0`, `yes`/`no`) | `false`        |
    ///
    /// Relative paths resolve against the current directory.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut builder = CoreConfig::builder()
            .database_path(value(ENV_DATABASE_PATH).unwrap_or_else(|| DEFAULT_DATABASE_PATH.into()))
            .library_dir(value(ENV_LIBRARY_DIR).unwrap_or_else(|| DEFAULT_LIBRARY_DIR.into()));

        if let Some(list) = value(ENV_AUDIO_EXTENSIONS) {
            builder = builder.audio_extensions(list.split(','));
        }

        if let Some(flag) = value(ENV_SCAN_RECURSIVE) {
            builder = builder.recursive(parse_flag(ENV_SCAN_RECURSIVE, &flag)?);
        }

        builder.build()
    }

    /// Validates the configuration.
    ///
    /// Called by the builder; exposed for configurations assembled by hand.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.library_dir.as_os_str().is_empty() {
            return Err(Error::Config("Library directory cannot be empty".to_string()));
        }

        if self.audio_extensions.is_empty() {
            return Err(Error::Config(
                "At least one audio extension must be configured".to_string(),
            ));
        }

        if let Some(bad) = self
            .audio_extensions
            .iter()
            .find(|ext| !ext.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(Error::Config(format!(
                "Invalid audio extension '{}': use letters and digits only, e.g. \"mp3\"",
                bad
            )));
        }

        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{} must be true or false, got '{}'",
            key, other
        ))),
    }
}

fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required to scan the library. \
                  Enable the `desktop-shims` feature or inject one with .file_system()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Option<Arc<dyn FileSystemAccess>> {
    Some(Arc::new(bridge_desktop::TokioFileSystem::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Option<Arc<dyn FileSystemAccess>> {
    None
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::Internal(format!("Cannot resolve current directory: {}", e)))?;
    Ok(cwd.join(path))
}

/// Builder for constructing a [`CoreConfig`] with fail-fast validation.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    library_dir: Option<PathBuf>,
    audio_extensions: Option<Vec<String>>,
    recursive: bool,
    file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl CoreConfigBuilder {
    /// Sets the database file path (required).
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the library root directory (required).
    pub fn library_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_dir = Some(path.into());
        self
    }

    /// Replaces the audio extension allow-list.
    ///
    /// Entries are trimmed, lowercased and may carry a leading dot; blank
    /// entries are ignored.
    pub fn audio_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !list.contains(&ext) {
                list.push(ext);
            }
        }
        self.audio_extensions = Some(list);
        self
    }

    /// Enables or disables recursive scanning.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets the file system access implementation.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Builds the final `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required setting is missing, a value is
    /// invalid, or no file system bridge is available.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;
        let library_dir = self.library_dir.ok_or_else(|| {
            Error::Config("Library directory is required. Use .library_dir() to set it.".to_string())
        })?;

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system().ok_or_else(file_system_missing_error)?,
        };

        let config = CoreConfig {
            database_path: absolutize(database_path)?,
            library_dir: absolutize(library_dir)?,
            audio_extensions: self.audio_extensions.unwrap_or_else(|| {
                DEFAULT_AUDIO_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect()
            }),
            recursive: self.recursive,
            file_system,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{error::Result as BridgeResult, FileMetadata};
    use std::collections::HashMap;
    use std::path::Path;

    struct MockFileSystem;

    #[async_trait]
    impl FileSystemAccess for MockFileSystem {
        async fn exists(&self, _path: &Path) -> BridgeResult<bool> {
            Ok(true)
        }

        async fn metadata(&self, _path: &Path) -> BridgeResult<FileMetadata> {
            Ok(FileMetadata::directory())
        }

        async fn list_directory(&self, _path: &Path) -> BridgeResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .database_path("/var/lib/music/library.db")
            .library_dir("/srv/music")
            .file_system(Arc::new(MockFileSystem))
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_builder_with_all_required_fields() {
        let config = builder().build().unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/music/library.db"));
        assert_eq!(config.library_dir, PathBuf::from("/srv/music"));
        assert_eq!(config.audio_extensions, DEFAULT_AUDIO_EXTENSIONS.to_vec());
        assert!(!config.recursive);
    }

    #[test]
    fn test_builder_requires_database_path() {
        let result = CoreConfig::builder()
            .library_dir("/srv/music")
            .file_system(Arc::new(MockFileSystem))
            .build();

        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("Database path is required")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_builder_requires_library_dir() {
        let result = CoreConfig::builder()
            .database_path("/tmp/music.db")
            .file_system(Arc::new(MockFileSystem))
            .build();

        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("Library directory")));
    }

    #[test]
    fn test_audio_extensions_are_normalized() {
        let config = builder()
            .audio_extensions([".MP3", " flac ", "", "mp3"])
            .build()
            .unwrap();

        assert_eq!(config.audio_extensions, vec!["mp3", "flac"]);
    }

    #[test]
    fn test_validate_rejects_empty_extension_list() {
        let result = builder().audio_extensions(["", " . "]).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_malformed_extension() {
        let result = builder().audio_extensions(["mp3", "tar.gz"]).build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("tar.gz")));
    }

    #[test]
    fn test_relative_paths_are_made_absolute() {
        let config = CoreConfig::builder()
            .database_path("library.db")
            .library_dir("Music")
            .file_system(Arc::new(MockFileSystem))
            .build()
            .unwrap();

        assert!(config.database_path.is_absolute());
        assert!(config.library_dir.is_absolute());
        assert!(config.library_dir.ends_with("Music"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_file_system_without_shims() {
        let result = CoreConfig::builder()
            .database_path("/tmp/music.db")
            .library_dir("/srv/music")
            .build();

        assert!(matches!(result, Err(Error::CapabilityMissing { .. })));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let result = CoreConfig::builder()
            .database_path("/tmp/music.db")
            .library_dir("/srv/music")
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let result = CoreConfig::from_lookup(lookup(&[
            (ENV_DATABASE_PATH, "/data/catalog.db"),
            (ENV_LIBRARY_DIR, "/data/music"),
            (ENV_AUDIO_EXTENSIONS, "mp3, .OGG"),
            (ENV_SCAN_RECURSIVE, "yes"),
        ]));

        if cfg!(feature = "desktop-shims") {
            let config = result.unwrap();
            assert_eq!(config.database_path, PathBuf::from("/data/catalog.db"));
            assert_eq!(config.library_dir, PathBuf::from("/data/music"));
            assert_eq!(config.audio_extensions, vec!["mp3", "ogg"]);
            assert!(config.recursive);
        } else {
            assert!(matches!(result, Err(Error::CapabilityMissing { .. })));
        }
    }

    #[test]
    fn test_from_lookup_rejects_bad_flag() {
        let result = CoreConfig::from_lookup(lookup(&[(ENV_SCAN_RECURSIVE, "sometimes")]));
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains(ENV_SCAN_RECURSIVE)));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(parse_flag("X", "1").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = builder().recursive(true).build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.recursive, config.recursive);
        assert!(format!("{:?}", cloned).contains("FileSystemAccess"));
    }
}
