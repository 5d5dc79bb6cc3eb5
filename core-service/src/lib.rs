//! Core service façade and bootstrap helpers.
//!
//! This crate wires the catalog store, the file system bridge and the tag
//! reader into a [`LibrarySynchronizer`] and exposes the operations a host
//! server needs: importing a directory, listing tracks and resolving a track
//! to its audio file. Desktop hosts enable the `desktop-shims` feature so the
//! configuration supplies a tokio-backed file system automatically.

pub mod error;

pub use error::{CoreError, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bridge_traits::storage::FileSystemAccess;
use core_library::repositories::{Page, PageRequest, SqliteTrackRepository, TrackRepository};
use core_library::{create_pool, DatabaseConfig, Track};
use core_metadata::{MetadataExtractor, TagReader};
use core_runtime::config::CoreConfig;
use core_sync::{
    normalize_path, resolve_scan_root, AudioExtensions, LibrarySynchronizer, SyncConfig,
    SyncSummary,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Aggregated handle to the collaborators the core requires.
pub struct CoreDependencies {
    pub tracks: Arc<dyn TrackRepository>,
    pub file_system: Arc<dyn FileSystemAccess>,
    pub tags: Arc<dyn TagReader>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit handles.
    pub fn new(
        tracks: Arc<dyn TrackRepository>,
        file_system: Arc<dyn FileSystemAccess>,
        tags: Arc<dyn TagReader>,
    ) -> Self {
        Self {
            tracks,
            file_system,
            tags,
        }
    }
}

/// A track together with the audio file backing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackFile {
    pub track: Track,
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CoreDependencies>,
    config: Arc<CoreConfig>,
    synchronizer: Arc<LibrarySynchronizer>,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    ///
    /// The file system in `deps` takes precedence over the one carried by
    /// `config`.
    pub fn new(deps: CoreDependencies, config: CoreConfig) -> Self {
        let sync_config = SyncConfig {
            audio_extensions: AudioExtensions::new(&config.audio_extensions),
            recursive: config.recursive,
            library_root: Some(config.library_dir.clone()),
        };

        let synchronizer = LibrarySynchronizer::new(
            Arc::clone(&deps.tracks),
            Arc::clone(&deps.file_system),
            Arc::clone(&deps.tags),
            sync_config,
        );

        Self {
            deps: Arc::new(deps),
            config: Arc::new(config),
            synchronizer: Arc::new(synchronizer),
        }
    }

    /// Open the catalog database and build the default collaborators.
    ///
    /// ```ignore
    /// let config = CoreConfig::from_env()?;
    /// let core = CoreService::bootstrap(config).await?;
    /// let summary = core.import_library(None).await?;
    /// ```
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        let pool = create_pool(DatabaseConfig::new(&config.database_path))
            .await
            .map_err(|e| {
                CoreError::InitializationFailed(format!(
                    "cannot open catalog at {}: {}",
                    config.database_path.display(),
                    e
                ))
            })?;

        let deps = CoreDependencies::new(
            Arc::new(SqliteTrackRepository::new(pool)),
            Arc::clone(&config.file_system),
            Arc::new(MetadataExtractor::new()),
        );

        info!(
            library_dir = %config.library_dir.display(),
            recursive = config.recursive,
            "Core service ready"
        );

        Ok(Self::new(deps, config))
    }

    /// Access the dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CoreDependencies> {
        Arc::clone(&self.deps)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Directory an import request refers to.
    ///
    /// Blank or missing input selects the library directory; relative input
    /// is taken relative to it.
    pub fn resolve_import_directory(&self, directory: Option<&str>) -> PathBuf {
        match directory.map(str::trim).filter(|d| !d.is_empty()) {
            Some(dir) => resolve_scan_root(Path::new(dir), &self.config.library_dir),
            None => normalize_path(&self.config.library_dir),
        }
    }

    /// Synchronize a directory with the catalog.
    #[instrument(skip(self))]
    pub async fn import_library(&self, directory: Option<&str>) -> Result<SyncSummary> {
        let target = self.resolve_import_directory(directory);
        let summary = self.synchronizer.synchronize(Some(&target)).await?;
        Ok(summary)
    }

    /// Tracks ordered by title.
    pub async fn list_tracks(&self, page: PageRequest) -> Result<Page<Track>> {
        Ok(self.deps.tracks.query(page).await?)
    }

    /// Resolve a track id to its audio file.
    ///
    /// # Errors
    ///
    /// [`CoreError::TrackNotFound`] when no record has this id,
    /// [`CoreError::FileMissing`] when the recorded path no longer names a
    /// regular file.
    pub async fn track_file(&self, id: &str) -> Result<TrackFile> {
        let track = self
            .deps
            .tracks
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::TrackNotFound(id.to_string()))?;

        let path = PathBuf::from(&track.path);

        if !self.deps.file_system.exists(&path).await? {
            return Err(CoreError::FileMissing(track.path));
        }

        let metadata = match self.deps.file_system.metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.is_not_found() => return Err(CoreError::FileMissing(track.path)),
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file {
            return Err(CoreError::FileMissing(track.path));
        }

        Ok(TrackFile {
            size: metadata.size,
            path,
            track,
        })
    }

    /// Whether an import of `directory` is currently running.
    pub fn is_importing(&self, directory: Option<&str>) -> bool {
        self.synchronizer
            .is_syncing(&self.resolve_import_directory(directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{error::Result as BridgeResult, BridgeError, FileMetadata};
    use core_library::{create_test_pool, NewTrack};
    use core_metadata::{Result as MetadataResult, TagMetadata};
    use mockall::mock;

    mock! {
        FileSystem {}

        #[async_trait]
        impl FileSystemAccess for FileSystem {
            async fn exists(&self, path: &Path) -> BridgeResult<bool>;
            async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata>;
            async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>>;
        }
    }

    mock! {
        Tags {}

        #[async_trait]
        impl TagReader for Tags {
            async fn read_tags(&self, path: &Path) -> MetadataResult<TagMetadata>;
        }
    }

    async fn service(fs: MockFileSystem) -> (CoreService, Arc<SqliteTrackRepository>) {
        let repo = Arc::new(SqliteTrackRepository::new(create_test_pool().await.unwrap()));
        let fs: Arc<dyn FileSystemAccess> = Arc::new(fs);
        let config = CoreConfig::builder()
            .database_path("/tmp/catalog.db")
            .library_dir("/srv/music")
            .file_system(Arc::clone(&fs))
            .build()
            .unwrap();

        let core = CoreService::new(
            CoreDependencies::new(repo.clone(), fs, Arc::new(MockTags::new())),
            config,
        );
        (core, repo)
    }

    async fn seed(repo: &SqliteTrackRepository, path: &str) -> Track {
        repo.insert(&NewTrack::new("Song", "Artist", path))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_import_directory() {
        let (core, _) = service(MockFileSystem::new()).await;

        assert_eq!(core.resolve_import_directory(None), PathBuf::from("/srv/music"));
        assert_eq!(core.resolve_import_directory(Some("  ")), PathBuf::from("/srv/music"));
        assert_eq!(
            core.resolve_import_directory(Some("Jazz/../Rock/")),
            PathBuf::from("/srv/music/Rock")
        );
        assert_eq!(
            core.resolve_import_directory(Some("/mnt//usb/./music")),
            PathBuf::from("/mnt/usb/music")
        );
    }

    #[tokio::test]
    async fn test_import_missing_directory_fails() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(false));

        let (core, _) = service(fs).await;
        let result = core.import_library(Some("Missing")).await;

        assert!(matches!(
            result,
            Err(CoreError::Sync(core_sync::SyncError::DirectoryNotFound(_)))
        ));
        assert!(!core.is_importing(Some("Missing")));
    }

    #[tokio::test]
    async fn test_list_tracks_orders_by_title() {
        let (core, repo) = service(MockFileSystem::new()).await;
        repo.insert(&NewTrack::new("beta", "X", "/srv/music/b.mp3"))
            .await
            .unwrap();
        repo.insert(&NewTrack::new("Alpha", "X", "/srv/music/a.mp3"))
            .await
            .unwrap();
        repo.insert(&NewTrack::new("gamma", "X", "/srv/music/c.mp3"))
            .await
            .unwrap();

        let page = core.list_tracks(PageRequest::new(0, 2)).await.unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        let titles: Vec<_> = page.items.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_track_file_unknown_id() {
        let (core, _) = service(MockFileSystem::new()).await;
        let result = core.track_file("nope").await;

        assert!(matches!(result, Err(CoreError::TrackNotFound(id)) if id == "nope"));
    }

    #[tokio::test]
    async fn test_track_file_missing_on_disk() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(false));

        let (core, repo) = service(fs).await;
        let track = seed(&repo, "/srv/music/gone.mp3").await;
        let result = core.track_file(&track.id).await;

        assert!(matches!(result, Err(CoreError::FileMissing(path)) if path == "/srv/music/gone.mp3"));
    }

    #[tokio::test]
    async fn test_track_file_vanishes_between_checks() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_metadata()
            .returning(|path| Err(BridgeError::NotFound(path.to_path_buf())));

        let (core, repo) = service(fs).await;
        let track = seed(&repo, "/srv/music/race.mp3").await;

        assert!(matches!(
            core.track_file(&track.id).await,
            Err(CoreError::FileMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_track_file_rejects_directory() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_metadata().returning(|_| Ok(FileMetadata::directory()));

        let (core, repo) = service(fs).await;
        let track = seed(&repo, "/srv/music/album.mp3").await;

        assert!(matches!(
            core.track_file(&track.id).await,
            Err(CoreError::FileMissing(_))
        ));
    }

    #[tokio::test]
    async fn test_track_file_success() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_metadata().returning(|_| Ok(FileMetadata::file(4096)));

        let (core, repo) = service(fs).await;
        let track = seed(&repo, "/srv/music/song.mp3").await;
        let file = core.track_file(&track.id).await.unwrap();

        assert_eq!(file.track, track);
        assert_eq!(file.path, PathBuf::from("/srv/music/song.mp3"));
        assert_eq!(file.size, 4096);
    }

    #[tokio::test]
    async fn test_track_file_propagates_io_errors() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| Ok(true));
        fs.expect_metadata()
            .returning(|_| Err(BridgeError::OperationFailed("permission denied".into())));

        let (core, repo) = service(fs).await;
        let track = seed(&repo, "/srv/music/locked.mp3").await;

        assert!(matches!(
            core.track_file(&track.id).await,
            Err(CoreError::Bridge(_))
        ));
    }
}
