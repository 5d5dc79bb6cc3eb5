//! Track repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{NewTrack, Track};
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query_as, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

/// SQLite caps bound parameters per statement; batch operations are chunked
/// below that limit.
const MAX_BIND_PARAMS: usize = 500;

/// Track repository interface for data access operations
///
/// Lookups that may return several rows (`find_by_paths`, `find_all`) return
/// them in insertion order. The synchronizer's "first match wins" tie-break
/// depends on that ordering being stable.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Find a track by its ID
    ///
    /// # Returns
    /// - `Ok(Some(track))` if found
    /// - `Ok(None)` if not found
    /// - `Err` if database error occurs
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>>;

    /// Find every track whose stored path is one of `paths`
    async fn find_by_paths(&self, paths: &[String]) -> Result<Vec<Track>>;

    /// List tracks, optionally restricted to paths under `path_prefix`
    ///
    /// The prefix filter is separator-aware: `/music` matches `/music` and
    /// `/music/a.mp3` but not `/music2/a.mp3`.
    async fn find_all(&self, path_prefix: Option<&str>) -> Result<Vec<Track>>;

    /// Insert a new track, returning the stored record with its assigned id
    ///
    /// # Errors
    /// Returns error if:
    /// - Track validation fails
    /// - Database error occurs
    async fn insert(&self, track: &NewTrack) -> Result<Track>;

    /// Update title, artist and path of an existing track
    ///
    /// # Errors
    /// Returns error if:
    /// - Track does not exist
    /// - Track validation fails
    /// - Database error occurs
    async fn update(&self, track: &Track) -> Result<()>;

    /// Delete all tracks with the given IDs in one transaction
    ///
    /// # Returns
    /// Number of rows removed (ids that did not exist are ignored)
    async fn delete_many(&self, ids: &[String]) -> Result<u64>;

    /// Query tracks ordered by title with pagination
    async fn query(&self, page_request: PageRequest) -> Result<Page<Track>>;

    /// Count total tracks
    async fn count(&self) -> Result<i64>;
}

/// SQLite implementation of TrackRepository
pub struct SqliteTrackRepository {
    pool: SqlitePool,
}

impl SqliteTrackRepository {
    /// Create a new SQLite track repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Build the `LIKE` pattern matching every path strictly below `prefix`.
fn descendant_pattern(prefix: &str) -> String {
    let sep = std::path::MAIN_SEPARATOR;
    let base = prefix.trim_end_matches(sep);

    let mut pattern = String::with_capacity(base.len() + 2);
    for c in base.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push(sep);
    pattern.push('%');
    pattern
}

#[async_trait]
impl TrackRepository for SqliteTrackRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Track>> {
        let track = query_as::<_, Track>("SELECT * FROM tracks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(track)
    }

    async fn find_by_paths(&self, paths: &[String]) -> Result<Vec<Track>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut tracks = Vec::new();
        for chunk in paths.chunks(MAX_BIND_PARAMS) {
            let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM tracks WHERE path IN (");
            let mut separated = builder.separated(", ");
            for path in chunk {
                separated.push_bind(path);
            }
            separated.push_unseparated(") ORDER BY rowid");

            let mut rows = builder
                .build_query_as::<Track>()
                .fetch_all(&self.pool)
                .await?;
            tracks.append(&mut rows);
        }

        Ok(tracks)
    }

    async fn find_all(&self, path_prefix: Option<&str>) -> Result<Vec<Track>> {
        let tracks = match path_prefix {
            Some(prefix) => {
                let exact = prefix.trim_end_matches(std::path::MAIN_SEPARATOR);
                query_as::<_, Track>(
                    "SELECT * FROM tracks WHERE path = ? OR path LIKE ? ESCAPE '\\' ORDER BY rowid",
                )
                .bind(exact)
                .bind(descendant_pattern(prefix))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                query_as::<_, Track>("SELECT * FROM tracks ORDER BY rowid")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(tracks)
    }

    async fn insert(&self, track: &NewTrack) -> Result<Track> {
        // Validate track data
        track.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "track".to_string(),
            message: msg,
        })?;

        let track = track.clone().into_track(Utc::now().timestamp());

        sqlx::query(
            r#"
            INSERT INTO tracks (id, title, artist, path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&track.id)
        .bind(&track.title)
        .bind(&track.artist)
        .bind(&track.path)
        .bind(track.created_at)
        .bind(track.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(id = %track.id, path = %track.path, "Inserted track");
        Ok(track)
    }

    async fn update(&self, track: &Track) -> Result<()> {
        // Validate track data
        track.validate().map_err(|msg| LibraryError::InvalidInput {
            field: "track".to_string(),
            message: msg,
        })?;

        let result = sqlx::query(
            r#"
            UPDATE tracks SET
                title = ?, artist = ?, path = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&track.title)
        .bind(&track.artist)
        .bind(&track.path)
        .bind(Utc::now().timestamp())
        .bind(&track.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::NotFound {
                entity_type: "Track".to_string(),
                id: track.id.clone(),
            });
        }

        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut deleted = 0;

        for chunk in ids.chunks(MAX_BIND_PARAMS) {
            let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM tracks WHERE id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id);
            }
            separated.push_unseparated(")");

            deleted += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        debug!(requested = ids.len(), deleted, "Deleted tracks");
        Ok(deleted)
    }

    async fn query(&self, page_request: PageRequest) -> Result<Page<Track>> {
        // Get total count
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;

        // Get paginated tracks
        let tracks = query_as::<_, Track>(
            "SELECT * FROM tracks ORDER BY title COLLATE NOCASE, rowid LIMIT ? OFFSET ?",
        )
        .bind(page_request.limit() as i64)
        .bind(page_request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(tracks, total.0 as u64, page_request))
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tracks")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
