//! Expands the paths given on the command line into image candidates.

use perceptual_dedup::core::ImageCandidate;
use perceptual_dedup::error::{DedupError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Decides which files are handed to the engine
pub struct ImageFilter {
    /// File extensions to include, lowercase
    extensions: HashSet<String>,
    /// Whether to include hidden files and directories
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a filter for the formats the decoder understands
    pub fn new() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"]
                .into_iter()
                .map(String::from)
                .collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Whether a directory should be descended into
    fn should_descend(&self, entry: &DirEntry) -> bool {
        // The roots were named explicitly, so they are always walked
        entry.depth() == 0 || self.include_hidden || !is_hidden(entry.path())
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walk every root and collect the image files below it.
///
/// Files named directly are taken as they are. Unreadable entries are
/// logged and skipped; a root that does not exist is an error.
pub fn collect_candidates(roots: &[PathBuf], filter: &ImageFilter) -> Result<Vec<ImageCandidate>> {
    let mut candidates = Vec::new();

    for root in roots {
        if !root.exists() {
            return Err(DedupError::Config(format!(
                "Path not found: {}",
                root.display()
            )));
        }

        if root.is_file() {
            candidates.push(ImageCandidate::new(root.clone()));
            continue;
        }

        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !entry.file_type().is_dir() || filter.should_descend(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = ?e.path(), "skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !filter.should_include(entry.path()) {
                continue;
            }

            let candidate = match entry.metadata() {
                Ok(metadata) => ImageCandidate::with_size(entry.path(), metadata.len()),
                Err(_) => ImageCandidate::new(entry.path()),
            };
            candidates.push(candidate);
        }
    }

    candidates.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn filter_includes_images_case_insensitively() {
        let filter = ImageFilter::new();
        assert!(filter.should_include(Path::new("/photos/image.jpg")));
        assert!(filter.should_include(Path::new("/photos/image.JPEG")));
        assert!(filter.should_include(Path::new("/photos/scan.png")));
    }

    #[test]
    fn filter_excludes_non_images() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/photos/document.pdf")));
        assert!(!filter.should_include(Path::new("/photos/README")));
    }

    #[test]
    fn filter_handles_hidden_files() {
        assert!(!ImageFilter::new().should_include(Path::new("/photos/.hidden.jpg")));
        assert!(ImageFilter::new()
            .with_hidden(true)
            .should_include(Path::new("/photos/.hidden.jpg")));
    }

    #[test]
    fn collects_images_recursively_and_skips_hidden_dirs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::create_dir_all(dir.path().join(".thumbnails")).unwrap();
        fs::write(dir.path().join("a.jpg"), b"abc").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("nested/b.png"), b"x").unwrap();
        fs::write(dir.path().join(".thumbnails/c.jpg"), b"x").unwrap();

        let candidates = collect_candidates(&[dir.path().to_path_buf()], &ImageFilter::new()).unwrap();
        let names: Vec<_> = candidates
            .iter()
            .map(|c| c.path().strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(names, vec![PathBuf::from("a.jpg"), PathBuf::from("nested/b.png")]);
        assert_eq!(candidates[0].size(), Some(3));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = collect_candidates(&[dir.path().join("missing")], &ImageFilter::new());
        assert!(matches!(result, Err(DedupError::Config(_))));
    }
}
