//! Audio Tag Extraction
//!
//! Reads the textual tags the library cares about (title, artist, album
//! artist, artist list) using the `lofty` crate. Supports ID3v2, Vorbis
//! Comments, MP4 ilst, APE and the other formats lofty can probe.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::{MetadataExtractor, TagReader};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = MetadataExtractor::new();
//! let tags = extractor.read_tags(Path::new("song.mp3")).await?;
//!
//! println!("Title: {}", tags.title.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use lofty::config::ParseOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// Textual tags read from an audio file
///
/// Every value is whitespace-normalized; blank values are dropped so callers
/// only ever see `Some` for meaningful text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    /// Individual track artists, in tag order
    pub artists: Vec<String>,
}

impl TagMetadata {
    /// True when the file carried none of the fields we read
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album_artist.is_none()
            && self.artists.is_empty()
    }
}

/// Reads tags from an audio file.
///
/// Failures are returned as values; the synchronizer treats any error as
/// "no tags" and falls back to file and directory names.
#[async_trait]
pub trait TagReader: Send + Sync {
    async fn read_tags(&self, path: &Path) -> Result<TagMetadata>;
}

/// Audio metadata extractor backed by `lofty`
pub struct MetadataExtractor {
    /// Parse options for lofty
    parse_options: ParseOptions,
}

impl MetadataExtractor {
    /// Create a new metadata extractor with default settings
    pub fn new() -> Self {
        // Audio properties are never used, skip decoding them.
        Self {
            parse_options: ParseOptions::new().read_properties(false),
        }
    }

    /// Create extractor with custom parse options
    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    fn parse(&self, path: &Path, data: Vec<u8>) -> Result<TagMetadata> {
        let probe = Probe::new(std::io::Cursor::new(data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to probe file: {}", e)))?;

        if probe.file_type().is_none() {
            return Err(MetadataError::UnsupportedFormat(path.display().to_string()));
        }

        let tagged_file = probe
            .read()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to parse file: {}", e)))?;

        // Prefer the format's primary tag, fall back to whatever is present
        let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

        match tag {
            Some(tag) => Ok(Self::read_fields(tag)),
            None => {
                debug!(path = %path.display(), "No tags found");
                Ok(TagMetadata::default())
            }
        }
    }

    fn read_fields(tag: &Tag) -> TagMetadata {
        TagMetadata {
            title: tag.title().and_then(|s| Self::non_blank(s.as_ref())),
            artist: tag.artist().and_then(|s| Self::non_blank(s.as_ref())),
            album_artist: tag
                .get_string(&ItemKey::AlbumArtist)
                .and_then(Self::non_blank),
            artists: tag
                .get_strings(&ItemKey::TrackArtist)
                .filter_map(Self::non_blank)
                .collect(),
        }
    }

    fn non_blank(text: &str) -> Option<String> {
        let normalized = Self::normalize_text(text);
        (!normalized.is_empty()).then_some(normalized)
    }

    /// Normalize text metadata
    ///
    /// - Trims leading/trailing whitespace
    /// - Normalizes consecutive whitespace to single space
    /// - Removes null bytes and control characters
    fn normalize_text(text: &str) -> String {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .filter(|c| !c.is_control())
            .collect()
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagReader for MetadataExtractor {
    async fn read_tags(&self, path: &Path) -> Result<TagMetadata> {
        debug!("Reading tags from: {}", path.display());

        let data = fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MetadataError::FileNotFound(path.display().to_string())
            } else {
                MetadataError::Io(e)
            }
        })?;

        self.parse(path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::tag::TagType;

    #[test]
    fn test_normalize_text() {
        assert_eq!(
            MetadataExtractor::normalize_text("  Hello   World  "),
            "Hello World"
        );
        assert_eq!(
            MetadataExtractor::normalize_text("Title\nWith\tWhitespace"),
            "Title With Whitespace"
        );
        assert_eq!(MetadataExtractor::normalize_text("Nul\0Byte"), "NulByte");
    }

    #[test]
    fn test_non_blank_drops_whitespace_only_values() {
        assert_eq!(MetadataExtractor::non_blank("   "), None);
        assert_eq!(MetadataExtractor::non_blank(""), None);
        assert_eq!(
            MetadataExtractor::non_blank(" Bar "),
            Some("Bar".to_string())
        );
    }

    #[test]
    fn test_read_fields_from_tag() {
        let mut tag = Tag::new(TagType::VorbisComments);
        tag.set_title("  Foo ".to_string());
        tag.set_artist("   ".to_string());
        tag.insert_text(ItemKey::AlbumArtist, "Various".to_string());

        let fields = MetadataExtractor::read_fields(&tag);
        assert_eq!(fields.title.as_deref(), Some("Foo"));
        assert_eq!(fields.artist, None);
        assert_eq!(fields.album_artist.as_deref(), Some("Various"));
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_tag_metadata_is_empty() {
        assert!(TagMetadata::default().is_empty());
        assert!(!TagMetadata {
            artists: vec!["A".to_string()],
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let extractor = MetadataExtractor::default();
        let result = extractor.parse(Path::new("noise.mp3"), b"not audio at all".to_vec());
        assert!(result.is_err());
    }
}
