//! Audio extension allow-list

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions imported when no list is configured.
pub const DEFAULT_AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "flac", "m4a", "aac", "wav", "ogg"];

/// Case-insensitive set of file extensions treated as audio.
///
/// Entries may be given with or without the leading dot. The same instance
/// decides both which files a pass imports and which records it prunes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct AudioExtensions {
    extensions: Vec<String>,
}

impl AudioExtensions {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        Self {
            extensions: normalized,
        }
    }

    /// Whether `path` ends in an allowed extension. Paths without an
    /// extension never match.
    pub fn is_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Allowed extensions, lowercase and without dots
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for AudioExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_EXTENSIONS)
    }
}

impl From<Vec<String>> for AudioExtensions {
    fn from(extensions: Vec<String>) -> Self {
        Self::new(extensions)
    }
}

impl From<AudioExtensions> for Vec<String> {
    fn from(extensions: AudioExtensions) -> Self {
        extensions.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list() {
        let filter = AudioExtensions::default();
        for name in ["a.mp3", "a.flac", "a.m4a", "a.aac", "a.wav", "a.ogg"] {
            assert!(filter.is_allowed(Path::new(name)), "{name} should be allowed");
        }
        assert!(!filter.is_allowed(Path::new("notes.txt")));
        assert!(!filter.is_allowed(Path::new("cover.jpg")));
    }

    #[test]
    fn test_case_insensitive() {
        let filter = AudioExtensions::default();
        assert!(filter.is_allowed(Path::new("/music/LOUD.MP3")));
        assert!(filter.is_allowed(Path::new("Mixed.FlAc")));
    }

    #[test]
    fn test_no_extension_is_rejected() {
        let filter = AudioExtensions::default();
        assert!(!filter.is_allowed(Path::new("README")));
        assert!(!filter.is_allowed(Path::new(".mp3")));
        assert!(!filter.is_allowed(Path::new("/music/mp3")));
    }

    #[test]
    fn test_entries_with_or_without_dot() {
        let filter = AudioExtensions::new([".OPUS", "wma", " .mp3 ", "", "wma"]);
        assert_eq!(filter.iter().collect::<Vec<_>>(), vec!["opus", "wma", "mp3"]);
        assert!(filter.is_allowed(Path::new("a.opus")));
        assert!(!filter.is_allowed(Path::new("a.flac")));
    }

    #[test]
    fn test_empty_list_allows_nothing() {
        let filter = AudioExtensions::new(Vec::<String>::new());
        assert!(filter.is_empty());
        assert!(!filter.is_allowed(Path::new("a.mp3")));
    }
}
