//! Domain models for the music library
//!
//! This module contains the persisted track record with validation and
//! database mapping.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Artist value stored when no source could name the artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Music track as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Track {
    /// Unique identifier, assigned by the store on insert
    pub id: String,
    /// Display title
    pub title: String,
    /// Display artist, `UNKNOWN_ARTIST` when unresolved
    pub artist: String,
    /// Absolute, normalized filesystem path of the audio file
    pub path: String,

    // Timestamps
    /// When first added
    pub created_at: i64,
    /// Last update time
    pub updated_at: i64,
}

impl Track {
    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(&self.title, &self.path)
    }

    /// Whether the artist was never resolved to a real value.
    pub fn has_unresolved_artist(&self) -> bool {
        self.artist.trim().is_empty() || self.artist == UNKNOWN_ARTIST
    }
}

/// Track data supplied by callers on insert; the store assigns the id and
/// timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub path: String,
}

impl NewTrack {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            path: path.into(),
        }
    }

    /// Validate track data
    pub fn validate(&self) -> Result<(), String> {
        validate_fields(&self.title, &self.path)
    }

    /// Materialize the record with a fresh identifier.
    pub fn into_track(self, now: i64) -> Track {
        Track {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            artist: self.artist,
            path: self.path,
            created_at: now,
            updated_at: now,
        }
    }
}

fn validate_fields(title: &str, path: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Track title cannot be empty".to_string());
    }

    // Relative paths are accepted: older catalogs stored them and the
    // synchronizer rewrites them to the canonical absolute form.
    if path.trim().is_empty() {
        return Err("Track path cannot be empty".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: &str) -> Track {
        NewTrack::new(title, artist, "/music/a.mp3").into_track(1_700_000_000)
    }

    #[test]
    fn test_into_track_assigns_id_and_timestamps() {
        let a = NewTrack::new("Song", "Artist", "/music/a.mp3").into_track(42);
        let b = NewTrack::new("Song", "Artist", "/music/a.mp3").into_track(42);

        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
        assert_eq!(a.created_at, 42);
        assert_eq!(a.updated_at, 42);
    }

    #[test]
    fn test_validate_rejects_blank_title_and_path() {
        assert!(track("Song", "Artist").validate().is_ok());
        assert!(track("   ", "Artist").validate().is_err());

        let mut t = track("Song", "Artist");
        t.path = String::new();
        assert!(t.validate().is_err());

        assert!(NewTrack::new("Song", "", "relative/a.mp3").validate().is_ok());
    }

    #[test]
    fn test_has_unresolved_artist() {
        assert!(track("Song", UNKNOWN_ARTIST).has_unresolved_artist());
        assert!(track("Song", "  ").has_unresolved_artist());
        assert!(!track("Song", "Radiohead").has_unresolved_artist());
    }
}
