//! # Metadata Module
//!
//! Works out what a track is called and who performed it.
//!
//! ## Overview
//!
//! This module handles:
//! - Audio tag extraction (ID3, Vorbis, MP4, FLAC) behind the [`TagReader`] contract
//! - The fallback chain from tags to file name, parent directory and placeholder

pub mod error;
pub mod extractor;
pub mod fallback;

pub use error::{MetadataError, Result};
pub use extractor::{MetadataExtractor, TagMetadata, TagReader};
pub use fallback::{resolve, split_artist_title, FallbackInput, MetadataSource, ResolvedMetadata};
