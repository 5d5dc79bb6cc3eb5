//! Path normalization and candidate resolution
//!
//! All helpers here are lexical: they never touch the file system, so
//! symlinks are not resolved and `..` is folded against the preceding
//! component.

use std::path::{Component, Path, PathBuf};

use crate::{Result, SyncError};

/// Lexically normalize a path.
///
/// Drops `.` components, folds `..` into the preceding component and removes
/// repeated or trailing separators. `..` at the root of an absolute path is
/// discarded; leading `..` of a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::Prefix(_)) | Some(Component::RootDir) => {}
                Some(Component::ParentDir) | Some(Component::CurDir) | None => {
                    normalized.push("..");
                }
            },
            Component::Normal(name) => normalized.push(name),
        }
    }

    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

/// Resolve the directory a pass should scan.
///
/// Absolute directories are normalized as-is; relative ones are joined onto
/// `base` first.
pub fn resolve_scan_root(directory: &Path, base: &Path) -> PathBuf {
    if directory.is_absolute() {
        normalize_path(directory)
    } else {
        normalize_path(&base.join(directory))
    }
}

/// Component-wise containment test: `/music/a.mp3` is within `/music`,
/// `/music2/a.mp3` is not.
pub fn is_within(root: &Path, path: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(root))
}

/// True when `path` sits directly inside `root`.
pub fn is_direct_child(root: &Path, path: &Path) -> bool {
    let path = normalize_path(path);
    path.parent() == Some(normalize_path(root).as_path())
}

/// Convert a path into the string form stored in the catalog.
pub fn path_to_string(path: &Path) -> Result<String> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| SyncError::InvalidPath(path.to_string_lossy().into_owned()))
}

/// Every string form under which a file may have been recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePaths {
    canonical: String,
    candidates: Vec<String>,
}

impl CandidatePaths {
    /// Build the candidate set for `file_name` found in `directory`.
    ///
    /// `directory` is the scan directory as it was joined, before
    /// normalization; its raw join with the file name is a candidate because
    /// older catalogs stored paths that way. `requested` is the directory
    /// argument exactly as the caller supplied it (it may be relative); when
    /// present, its normalized join with the file name is a candidate too.
    pub fn resolve(directory: &Path, file_name: &str, requested: Option<&Path>) -> Result<Self> {
        let joined = directory.join(file_name);
        let canonical = path_to_string(&normalize_path(&joined))?;
        let mut candidates = vec![canonical.clone()];

        let mut push = |value: String| {
            if !candidates.contains(&value) {
                candidates.push(value);
            }
        };
        push(path_to_string(&joined)?);

        if let Some(requested) = requested {
            push(path_to_string(&normalize_path(&requested.join(file_name)))?);
        }

        Ok(Self {
            canonical,
            candidates,
        })
    }

    /// Absolute, normalized path of the file
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Candidate strings, canonical first, without duplicates
    pub fn all(&self) -> &[String] {
        &self.candidates
    }
}
