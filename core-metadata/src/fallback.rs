//! Metadata fallback chain
//!
//! Decides the title and artist of a file from whatever evidence is available.
//! Resolution never fails: every chain ends in a value derived from the file
//! name or in the unknown-artist placeholder.
//!
//! - Title: tag title, then the title half of an `Artist - Title` file name,
//!   then the bare file stem.
//! - Artist: tag artist, tag album artist, first tag artist-list entry, the
//!   artist half of the file name, the parent directory name (unless it is
//!   the scanned directory itself), then `"Unknown Artist"`.

use core_library::UNKNOWN_ARTIST;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::extractor::TagMetadata;

/// Separators tried in order when splitting `Artist - Title` stems. Spaced
/// forms come first so `AC-DC - Song` splits on the spaced dash.
const SEPARATORS: [&str; 8] = [
    " - ", " \u{2013} ", " \u{2014} ", " \u{2015} ", "-", "\u{2013}", "\u{2014}", "\u{2015}",
];

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    Tag,
    Filename,
    Directory,
    Placeholder,
}

/// Title and artist chosen for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub title: String,
    pub title_source: MetadataSource,
    pub artist: String,
    pub artist_source: MetadataSource,
}

/// Evidence available for a single file
#[derive(Debug, Clone, Copy)]
pub struct FallbackInput<'a> {
    /// Tag read result; `None` when the file had no tags or reading failed
    pub tags: Option<&'a TagMetadata>,
    /// File name including extension
    pub file_name: &'a str,
    /// Name of the directory containing the file
    pub parent_dir_name: Option<&'a str>,
    /// Name of the scanned root directory
    pub root_dir_name: Option<&'a str>,
}

/// Resolve title and artist for a file.
pub fn resolve(input: &FallbackInput<'_>) -> ResolvedMetadata {
    let stem = file_stem(input.file_name);
    let from_name = split_artist_title(stem);
    let tags = input.tags;

    let (title, title_source) = tags
        .and_then(|t| non_blank(t.title.as_deref()))
        .map(|t| (t, MetadataSource::Tag))
        .or_else(|| {
            from_name
                .as_ref()
                .map(|(_, title)| (title.clone(), MetadataSource::Filename))
        })
        .unwrap_or_else(|| {
            let stem = stem.trim();
            let title = if stem.is_empty() { input.file_name } else { stem };
            (title.to_string(), MetadataSource::Filename)
        });

    let (artist, artist_source) = tags
        .and_then(tag_artist)
        .map(|a| (a, MetadataSource::Tag))
        .or_else(|| {
            from_name
                .as_ref()
                .map(|(artist, _)| (artist.clone(), MetadataSource::Filename))
        })
        .or_else(|| {
            directory_artist(input.parent_dir_name, input.root_dir_name)
                .map(|a| (a, MetadataSource::Directory))
        })
        .unwrap_or_else(|| (UNKNOWN_ARTIST.to_string(), MetadataSource::Placeholder));

    ResolvedMetadata {
        title,
        title_source,
        artist,
        artist_source,
    }
}

/// Split an `Artist - Title` stem.
///
/// The first separator yielding at least two non-empty segments wins. The
/// first segment is the artist; the remaining segments are joined back into
/// the title.
pub fn split_artist_title(stem: &str) -> Option<(String, String)> {
    SEPARATORS.iter().find_map(|sep| {
        let segments: Vec<&str> = stem
            .split(sep)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if segments.len() < 2 {
            return None;
        }

        let joiner = if sep.starts_with(' ') { " - " } else { sep };
        Some((segments[0].to_string(), segments[1..].join(joiner)))
    })
}

/// File name without its final extension.
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

fn tag_artist(tags: &TagMetadata) -> Option<String> {
    non_blank(tags.artist.as_deref())
        .or_else(|| non_blank(tags.album_artist.as_deref()))
        .or_else(|| tags.artists.iter().find_map(|a| non_blank(Some(a))))
}

fn directory_artist(parent: Option<&str>, root: Option<&str>) -> Option<String> {
    let parent = non_blank(parent)?;
    match non_blank(root) {
        Some(root) if root == parent => None,
        _ => Some(parent),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
