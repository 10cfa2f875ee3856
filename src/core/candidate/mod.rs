//! # Candidate Module
//!
//! The unit of work handed to the engine: one resolved image path.
//! Folder traversal and extension filtering happen before this point.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// An image file supplied by the caller for one run
#[derive(Debug, Clone)]
pub struct ImageCandidate {
    path: PathBuf,
    /// File size, read from disk the first time it is asked for
    size: OnceLock<Option<u64>>,
}

impl ImageCandidate {
    /// Create a candidate whose size is looked up lazily
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: OnceLock::new(),
        }
    }

    /// Create a candidate whose size the caller already knows
    pub fn with_size(path: impl Into<PathBuf>, size: u64) -> Self {
        let candidate = Self::new(path);
        let _ = candidate.size.set(Some(size));
        candidate
    }

    /// Path to the image file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes, or `None` if the file can't be stat'ed
    pub fn size(&self) -> Option<u64> {
        *self
            .size
            .get_or_init(|| fs::metadata(&self.path).ok().map(|m| m.len()))
    }
}

impl From<PathBuf> for ImageCandidate {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for ImageCandidate {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}
