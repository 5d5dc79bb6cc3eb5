//! Integration tests for tag extraction
//!
//! These tests exercise the error paths of the lofty-backed reader. Files
//! that cannot be read must come back as `Err` so the synchronizer can fall
//! back to file name heuristics.

use core_metadata::{
    resolve, FallbackInput, MetadataError, MetadataExtractor, MetadataSource, TagReader,
};
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn test_read_missing_file() {
    let dir = tempdir().unwrap();
    let missing_path = dir.path().join("nonexistent.mp3");

    let extractor = MetadataExtractor::new();
    let result = extractor.read_tags(&missing_path).await;

    assert!(matches!(result, Err(MetadataError::FileNotFound(_))));
}

#[tokio::test]
async fn test_read_corrupted_file() {
    let dir = tempdir().unwrap();
    let corrupt_path = dir.path().join("corrupt.mp3");
    fs::write(&corrupt_path, b"This is not a valid audio file").unwrap();

    let extractor = MetadataExtractor::new();
    let result = extractor.read_tags(&corrupt_path).await;

    assert!(result.is_err(), "Should fail for corrupted file");
}

#[tokio::test]
async fn test_failed_read_falls_back_to_filename() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Daft Punk - Around the World.mp3");
    fs::write(&path, b"garbage").unwrap();

    let extractor = MetadataExtractor::default();
    let tags = extractor.read_tags(&path).await.ok();

    let resolved = resolve(&FallbackInput {
        tags: tags.as_ref(),
        file_name: "Daft Punk - Around the World.mp3",
        parent_dir_name: None,
        root_dir_name: None,
    });

    assert_eq!(resolved.artist, "Daft Punk");
    assert_eq!(resolved.title, "Around the World");
    assert_eq!(resolved.artist_source, MetadataSource::Filename);
}

#[tokio::test]
async fn test_reader_usable_as_trait_object() {
    let reader: Box<dyn TagReader> = Box::new(MetadataExtractor::new());
    let dir = tempdir().unwrap();

    assert!(reader.read_tags(&dir.path().join("none.flac")).await.is_err());
}
