//! # Error Module
//!
//! Error types for the duplicate detection engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, dimensions, what went wrong
//! - **Per-item failures are values** - a broken photo is counted and
//!   skipped, it never aborts the batch
//! - **Only run-level failures propagate** - see [`DedupError`]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error for a whole run.
///
/// Anything surfaced through this type aborts the run with no
/// partial-result guarantee.
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Fingerprinting error: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fatal error, run aborted: {0}")]
    Fatal(String),
}

/// Per-item failures while computing a fingerprint.
#[derive(Error, Debug, Clone)]
pub enum FingerprintError {
    #[error("Failed to decode image {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("Failed to open image file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Image {path} is {width}x{height}, too small or too elongated to fingerprint reliably")]
    DegenerateImage {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Fingerprinting {path} took {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout {
        path: PathBuf,
        elapsed_ms: u64,
        budget_ms: u64,
    },
}

impl FingerprintError {
    /// Path of the photo that failed
    pub fn path(&self) -> &Path {
        match self {
            FingerprintError::UnreadableFile { path, .. }
            | FingerprintError::Io { path, .. }
            | FingerprintError::DegenerateImage { path, .. }
            | FingerprintError::Timeout { path, .. } => path,
        }
    }

    /// Coarse classification used for counting and reporting
    pub fn kind(&self) -> FailureKind {
        match self {
            FingerprintError::UnreadableFile { .. } | FingerprintError::Io { .. } => {
                FailureKind::Unreadable
            }
            FingerprintError::DegenerateImage { .. } => FailureKind::Degenerate,
            FingerprintError::Timeout { .. } => FailureKind::Timeout,
        }
    }

    /// Re-attach a path to an error raised without one (decoders and
    /// resizers work on in-memory buffers).
    pub fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            FingerprintError::UnreadableFile { reason, .. } => {
                FingerprintError::UnreadableFile { path, reason }
            }
            FingerprintError::Io { reason, .. } => FingerprintError::Io { path, reason },
            FingerprintError::DegenerateImage { width, height, .. } => {
                FingerprintError::DegenerateImage {
                    path,
                    width,
                    height,
                }
            }
            FingerprintError::Timeout {
                elapsed_ms,
                budget_ms,
                ..
            } => FingerprintError::Timeout {
                path,
                elapsed_ms,
                budget_ms,
            },
        }
    }
}

/// Why a single photo was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Missing, unreadable or corrupt file
    Unreadable,
    /// Below the minimum size or outside the aspect-ratio bounds
    Degenerate,
    /// Exceeded the per-item time budget
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Unreadable => write!(f, "unreadable"),
            FailureKind::Degenerate => write!(f, "degenerate"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// Errors that occur during duplicate comparison
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("Invalid threshold: {value} (must be 0-{max})")]
    InvalidThreshold { value: u32, max: u32 },

    #[error("Invalid bucket prefix: {bits} bits (at most {max} for these fingerprints)")]
    InvalidBucketBits { bits: u32, max: u32 },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DedupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_includes_path_and_reason() {
        let error = FingerprintError::UnreadableFile {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn degenerate_error_reports_dimensions() {
        let error = FingerprintError::DegenerateImage {
            path: PathBuf::from("/photos/banner.png"),
            width: 400,
            height: 20,
        };
        assert!(error.to_string().contains("400x20"));
        assert_eq!(error.kind(), FailureKind::Degenerate);
    }

    #[test]
    fn io_and_decode_failures_count_as_unreadable() {
        let io = FingerprintError::Io {
            path: PathBuf::from("/a.jpg"),
            reason: "not found".to_string(),
        };
        let timeout = FingerprintError::Timeout {
            path: PathBuf::from("/b.jpg"),
            elapsed_ms: 31_000,
            budget_ms: 30_000,
        };
        assert_eq!(io.kind(), FailureKind::Unreadable);
        assert_eq!(timeout.kind(), FailureKind::Timeout);
    }

    #[test]
    fn with_path_replaces_empty_path() {
        let error = FingerprintError::UnreadableFile {
            path: PathBuf::new(),
            reason: "Resize failed".to_string(),
        }
        .with_path(Path::new("/photos/x.png"));

        assert_eq!(error.path(), Path::new("/photos/x.png"));
    }

    #[test]
    fn threshold_error_names_the_limit() {
        let error = CompareError::InvalidThreshold { value: 70, max: 64 };
        assert!(error.to_string().contains("0-64"));
    }
}
