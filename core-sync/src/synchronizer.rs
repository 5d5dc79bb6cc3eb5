//! # Library Synchronizer
//!
//! Reconciles a directory on disk against the track catalog.
//!
//! ## Workflow
//!
//! 1. Resolve and validate the scan root (missing or non-directory roots are fatal)
//! 2. List entries, keeping regular files with an allowed extension
//! 3. For each file: read tags, resolve title and artist, look up existing
//!    records under every candidate path, then create, update or deduplicate
//! 4. Prune records in scope whose file is gone, no longer audio, or was not
//!    seen during this pass
//!
//! Files are processed one at a time. A failure on one file is logged and
//! counted; the pass carries on with the next one.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{LibrarySynchronizer, SyncConfig};
//! use std::sync::Arc;
//!
//! let synchronizer = LibrarySynchronizer::new(tracks, fs, tags, SyncConfig::default());
//! let summary = synchronizer.synchronize(Some(Path::new("/srv/music"))).await?;
//! println!("{} created, {} removed", summary.created, summary.removed);
//! ```

use crate::filter::AudioExtensions;
use crate::paths::{
    is_direct_child, is_within, normalize_path, path_to_string, resolve_scan_root, CandidatePaths,
};
use crate::{Result, SyncError};
use bridge_traits::storage::FileSystemAccess;
use core_library::repositories::TrackRepository;
use core_library::{NewTrack, Track};
use core_metadata::{resolve, FallbackInput, MetadataSource, ResolvedMetadata, TagReader};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument, warn};

/// Upper bound on nesting below the scan root in recursive mode.
const MAX_SCAN_DEPTH: usize = 64;

/// Synchronizer configuration
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Extensions treated as audio on both scan and prune
    pub audio_extensions: AudioExtensions,

    /// Walk subdirectories instead of only the root's direct entries
    pub recursive: bool,

    /// Library root. Relative scan directories are resolved against it.
    pub library_root: Option<PathBuf>,
}

/// Counters reported by one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Audio files considered
    pub scanned: usize,
    pub created: usize,
    pub updated: usize,
    /// Duplicate records removed while matching
    pub deduplicated: usize,
    /// Stale records removed by the prune step
    pub removed: usize,
    /// Entries ignored (directories, other file types)
    pub skipped: usize,
    /// Entries that could not be processed
    pub failed: usize,
}

impl SyncSummary {
    /// True when the pass left the catalog untouched
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deduplicated == 0 && self.removed == 0
    }
}

#[derive(Debug, Default)]
struct FileOutcome {
    created: bool,
    updated: bool,
    deleted_ids: Vec<String>,
}

/// Working state of a pass
struct SyncPass<'a> {
    root: &'a Path,
    requested: Option<&'a Path>,
    root_name: Option<String>,
    scanned_paths: HashSet<String>,
    deleted_ids: HashSet<String>,
    summary: SyncSummary,
}

/// Releases the directory gate when a pass ends, however it ends.
struct SyncGuard {
    active_syncs: Arc<Mutex<HashSet<PathBuf>>>,
    directory: PathBuf,
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        let mut active = self
            .active_syncs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.directory);
    }
}

/// Reconciles directories against the track catalog
pub struct LibrarySynchronizer {
    tracks: Arc<dyn TrackRepository>,
    file_system: Arc<dyn FileSystemAccess>,
    tags: Arc<dyn TagReader>,
    config: SyncConfig,
    active_syncs: Arc<Mutex<HashSet<PathBuf>>>,
}

impl LibrarySynchronizer {
    pub fn new(
        tracks: Arc<dyn TrackRepository>,
        file_system: Arc<dyn FileSystemAccess>,
        tags: Arc<dyn TagReader>,
        config: SyncConfig,
    ) -> Self {
        Self {
            tracks,
            file_system,
            tags,
            config,
            active_syncs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Check whether a pass over `directory` is currently running
    pub fn is_syncing(&self, directory: &Path) -> bool {
        let active = self
            .active_syncs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.contains(&normalize_path(directory))
    }

    /// Synchronize `directory` (or the library root when `None`) with the catalog.
    ///
    /// # Errors
    ///
    /// Fails before touching the catalog if the directory is missing, is not
    /// a directory, cannot be listed, or is already being synchronized.
    /// Problems with individual files are counted in
    /// [`SyncSummary::failed`] instead.
    #[instrument(skip(self))]
    pub async fn synchronize(&self, directory: Option<&Path>) -> Result<SyncSummary> {
        let base = self.base_directory()?;
        let raw_root = match directory {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => base.join(dir),
            None => base.clone(),
        };
        let root = resolve_scan_root(&raw_root, &base);

        let _guard = self.acquire(&root)?;

        match self.file_system.metadata(&root).await {
            Ok(meta) if meta.is_directory => {}
            Ok(_) => return Err(SyncError::NotADirectory(root)),
            Err(e) if e.is_not_found() => return Err(SyncError::DirectoryNotFound(root)),
            Err(e) => return Err(SyncError::Bridge(e)),
        }

        info!(root = %root.display(), recursive = self.config.recursive, "Starting library sync");

        let root_name = root
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);

        let mut pass = SyncPass {
            root: &root,
            requested: directory,
            root_name,
            scanned_paths: HashSet::new(),
            deleted_ids: HashSet::new(),
            summary: SyncSummary::default(),
        };

        // The root listing is fatal; nested listings are per-entry failures.
        let entries = self.list_sorted(&root).await?;
        let mut pending = vec![(raw_root, PathBuf::new(), entries)];

        // Each physical directory is listed once, however many links reach it.
        let mut visited = HashSet::new();
        visited.insert(self.directory_key(&root).await);

        while let Some((raw_dir, relative, entries)) = pending.pop() {
            for entry in entries {
                if let Some(subdir) = self.process_entry(&mut pass, &raw_dir, &relative, &entry).await {
                    if relative.components().count() >= MAX_SCAN_DEPTH {
                        warn!(file = %subdir.display(), "Directory nesting too deep, not descending");
                        pass.summary.skipped += 1;
                        continue;
                    }

                    if !visited.insert(self.directory_key(&subdir).await) {
                        debug!(file = %subdir.display(), "Directory already scanned, not descending");
                        pass.summary.skipped += 1;
                        continue;
                    }

                    let name = subdir.file_name().unwrap_or_default();
                    match self.list_sorted(&subdir).await {
                        Ok(children) => {
                            pending.push((raw_dir.join(&name), relative.join(&name), children))
                        }
                        Err(e) => {
                            warn!(file = %subdir.display(), error = %e, "Failed to list directory");
                            pass.summary.failed += 1;
                        }
                    }
                }
            }
        }

        pass.summary.removed = self.prune(&pass).await;

        let summary = pass.summary;
        info!(
            scanned = summary.scanned,
            created = summary.created,
            updated = summary.updated,
            deduplicated = summary.deduplicated,
            removed = summary.removed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Library sync completed"
        );

        Ok(summary)
    }

    fn base_directory(&self) -> Result<PathBuf> {
        match &self.config.library_root {
            Some(root) if root.is_absolute() => Ok(normalize_path(root)),
            other => {
                let cwd = std::env::current_dir().map_err(|e| {
                    SyncError::InvalidPath(format!("cannot resolve current directory: {}", e))
                })?;
                Ok(match other {
                    Some(root) => normalize_path(&cwd.join(root)),
                    None => cwd,
                })
            }
        }
    }

    fn acquire(&self, directory: &Path) -> Result<SyncGuard> {
        let mut active = self
            .active_syncs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !active.insert(directory.to_path_buf()) {
            return Err(SyncError::SyncInProgress {
                directory: directory.to_path_buf(),
            });
        }

        Ok(SyncGuard {
            active_syncs: Arc::clone(&self.active_syncs),
            directory: directory.to_path_buf(),
        })
    }

    /// Identity of a directory for cycle detection: its canonical path, or
    /// the lexical form when the backend cannot resolve it.
    async fn directory_key(&self, directory: &Path) -> PathBuf {
        match self.file_system.canonicalize(directory).await {
            Ok(canonical) => normalize_path(&canonical),
            Err(e) => {
                debug!(file = %directory.display(), error = %e, "Cannot canonicalize directory");
                normalize_path(directory)
            }
        }
    }

    async fn list_sorted(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = self.file_system.list_directory(directory).await?;
        entries.sort();
        Ok(entries)
    }

    /// Classify and process one listed entry. Returns the entry back when it
    /// is a directory the pass should descend into.
    async fn process_entry(
        &self,
        pass: &mut SyncPass<'_>,
        raw_dir: &Path,
        relative: &Path,
        entry: &Path,
    ) -> Option<PathBuf> {
        let meta = match self.file_system.metadata(entry).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(file = %entry.display(), error = %e, "Failed to stat entry");
                pass.summary.failed += 1;
                return None;
            }
        };

        if meta.is_directory {
            if self.config.recursive {
                return Some(entry.to_path_buf());
            }
            pass.summary.skipped += 1;
            return None;
        }

        if !meta.is_file || !self.config.audio_extensions.is_allowed(entry) {
            pass.summary.skipped += 1;
            return None;
        }

        pass.summary.scanned += 1;

        let Some(file_name) = entry.file_name().and_then(|name| name.to_str()) else {
            warn!(file = %entry.display(), "Skipping file with non UTF-8 name");
            pass.summary.failed += 1;
            return None;
        };

        let requested = pass.requested.map(|dir| dir.join(relative));
        match self
            .process_file(pass, raw_dir, file_name, requested.as_deref())
            .await
        {
            Ok(outcome) => {
                if outcome.created {
                    pass.summary.created += 1;
                }
                if outcome.updated {
                    pass.summary.updated += 1;
                }
                pass.summary.deduplicated += outcome.deleted_ids.len();
                pass.deleted_ids.extend(outcome.deleted_ids);
            }
            Err(e) => {
                warn!(file = %entry.display(), error = %e, "Failed to sync file");
                pass.summary.failed += 1;
            }
        }

        None
    }

    async fn process_file(
        &self,
        pass: &mut SyncPass<'_>,
        raw_dir: &Path,
        file_name: &str,
        requested: Option<&Path>,
    ) -> Result<FileOutcome> {
        let candidates = CandidatePaths::resolve(raw_dir, file_name, requested)?;
        let canonical = candidates.canonical().to_string();
        // Every form counts as seen so a failed update cannot get the record pruned
        pass.scanned_paths.extend(candidates.all().iter().cloned());

        let canonical_path = PathBuf::from(&canonical);
        let tags = match self.tags.read_tags(&canonical_path).await {
            Ok(tags) => Some(tags),
            Err(e) => {
                debug!(file = %canonical, error = %e, "No usable tags");
                None
            }
        };

        let parent_name = canonical_path
            .parent()
            .and_then(|parent| parent.file_name())
            .and_then(|name| name.to_str());

        let resolved = resolve(&FallbackInput {
            tags: tags.as_ref(),
            file_name,
            parent_dir_name: parent_name,
            root_dir_name: pass.root_name.as_deref(),
        });

        let mut matches = self.tracks.find_by_paths(candidates.all()).await?;

        if matches.is_empty() {
            let track = self
                .tracks
                .insert(&NewTrack::new(resolved.title, resolved.artist, canonical))
                .await?;
            debug!(id = %track.id, path = %track.path, "Created track");
            return Ok(FileOutcome {
                created: true,
                ..Default::default()
            });
        }

        let keep = matches
            .iter()
            .position(|track| normalize_path(Path::new(&track.path)) == canonical_path)
            .unwrap_or(0);
        let mut record = matches.remove(keep);
        let duplicate_ids: Vec<String> = matches.into_iter().map(|track| track.id).collect();

        let updated = if reconcile(&mut record, &canonical, file_name, &resolved) {
            self.tracks.update(&record).await?;
            debug!(id = %record.id, path = %record.path, "Updated track");
            true
        } else {
            false
        };

        if !duplicate_ids.is_empty() {
            self.tracks.delete_many(&duplicate_ids).await?;
            info!(
                id = %record.id,
                duplicates = duplicate_ids.len(),
                path = %record.path,
                "Removed duplicate tracks"
            );
        }

        Ok(FileOutcome {
            created: false,
            updated,
            deleted_ids: duplicate_ids,
        })
    }

    /// Remove records in scope that no longer point at an audio file seen by
    /// this pass. Returns the number of records removed.
    async fn prune(&self, pass: &SyncPass<'_>) -> usize {
        let root = pass.root;
        let records = match path_to_string(root) {
            Ok(prefix) => self.tracks.find_all(Some(&prefix)).await,
            Err(e) => {
                warn!(error = %e, "Cannot prune directory");
                return 0;
            }
        };

        let records = match records {
            Ok(records) => records,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Failed to load tracks for pruning");
                return 0;
            }
        };

        let mut stale = Vec::new();
        for record in records {
            if pass.deleted_ids.contains(&record.id) {
                continue;
            }

            let path = Path::new(&record.path);
            let in_scope = if self.config.recursive {
                is_within(root, path)
            } else {
                is_direct_child(root, path)
            };
            if !in_scope {
                continue;
            }

            if let Some(reason) = self.stale_reason(&record, &pass.scanned_paths).await {
                debug!(id = %record.id, path = %record.path, reason, "Stale track");
                stale.push(record.id);
            }
        }

        if stale.is_empty() {
            return 0;
        }

        match self.tracks.delete_many(&stale).await {
            Ok(removed) => {
                info!(removed, "Pruned stale tracks");
                removed as usize
            }
            Err(e) => {
                warn!(count = stale.len(), error = %e, "Failed to prune stale tracks");
                0
            }
        }
    }

    async fn stale_reason(&self, record: &Track, scanned: &HashSet<String>) -> Option<&'static str> {
        let path = Path::new(&record.path);

        if !self.config.audio_extensions.is_allowed(path) {
            return Some("extension not allowed");
        }

        match self.file_system.exists(path).await {
            Ok(true) => {}
            Ok(false) => return Some("file missing"),
            Err(_) => return Some("existence check failed"),
        }

        match self.file_system.metadata(path).await {
            Ok(meta) if meta.is_file => {}
            Ok(_) => return Some("not a regular file"),
            Err(_) => return Some("stat failed"),
        }

        if !scanned.contains(&record.path) {
            return Some("not seen during scan");
        }

        None
    }
}

/// Apply resolved metadata to an existing record. Returns whether anything
/// changed.
fn reconcile(record: &mut Track, canonical: &str, file_name: &str, resolved: &ResolvedMetadata) -> bool {
    let mut changed = false;

    let path_changed = record.path != canonical;
    if path_changed {
        record.path = canonical.to_string();
        changed = true;
    }

    let replace_title = record.title.trim().is_empty()
        || record.title == file_name
        || (path_changed && resolved.title_source == MetadataSource::Tag);
    if replace_title && record.title != resolved.title {
        record.title = resolved.title.clone();
        changed = true;
    }

    let replace_artist = record.has_unresolved_artist()
        || (path_changed && resolved.artist_source == MetadataSource::Tag);
    if replace_artist && record.artist != resolved.artist {
        record.artist = resolved.artist.clone();
        changed = true;
    }

    changed
}
