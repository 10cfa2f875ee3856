//! # Comparator Module
//!
//! Turns a path -> fingerprint map into duplicate groups.
//!
//! ## How It Works
//! 1. Paths with identical fingerprints are grouped directly (no comparison)
//! 2. Distinct fingerprints are bucketed by their leading bits
//! 3. Each bucket is grouped by the configured [`GroupingPolicy`]
//! 4. Groups with a single path are dropped
//!
//! ## Comparison Thresholds
//! | Distance | Classification |
//! |----------|---------------|
//! | 0        | Exact match   |
//! | 1-4      | Near-exact    |
//! | 5-10     | Similar       |
//! | 11+      | Maybe similar |

mod bucket;
mod engine;
mod grouper;
mod threshold;

pub use bucket::{BucketIndex, BucketStats, DEFAULT_BUCKET_BITS};
pub use engine::{ClusterConfig, ClusterOutput, ClusteringEngine};
pub use grouper::{BucketGrouping, GroupingPolicy, Link};
pub use threshold::{ThresholdStrategy, DEFAULT_THRESHOLD};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Two photos found within the threshold of each other
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMatch {
    pub path_a: PathBuf,
    pub path_b: PathBuf,
    pub distance: u32,
}

/// Classification of match types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatchType {
    /// Distance = 0, identical perceptual content
    Exact,
    /// Distance 1-4, virtually identical
    NearExact,
    /// Distance 5-10, likely duplicates
    Similar,
    /// Distance 11+, possibly related
    MaybeSimilar,
}

impl MatchType {
    /// Classify based on Hamming distance
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => MatchType::Exact,
            1..=4 => MatchType::NearExact,
            5..=10 => MatchType::Similar,
            _ => MatchType::MaybeSimilar,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "Exact Match"),
            MatchType::NearExact => write!(f, "Near-Exact Match"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::MaybeSimilar => write!(f, "Possibly Similar"),
        }
    }
}

/// A group of duplicate photos.
///
/// Always holds at least two distinct paths, sorted lexically. The id is
/// only meaningful within the run that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    id: Uuid,
    paths: Vec<PathBuf>,
    max_distance: u32,
    match_type: MatchType,
    duplicate_size_bytes: u64,
}

impl DuplicateGroup {
    /// Build a group, or `None` if fewer than two distinct paths remain.
    ///
    /// `max_distance` is the largest distance among the matches that
    /// formed the group.
    pub fn new(mut paths: Vec<PathBuf>, max_distance: u32) -> Option<Self> {
        paths.sort();
        paths.dedup();
        if paths.len() < 2 {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            paths,
            max_distance,
            match_type: MatchType::from_distance(max_distance),
            duplicate_size_bytes: 0,
        })
    }

    /// Identifier, unique within one run
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// All photos in the group
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The photo listed first, suggested as the one to keep
    pub fn representative(&self) -> &Path {
        &self.paths[0]
    }

    /// Number of photos in the group
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; groups hold at least two photos
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `path` belongs to this group
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.binary_search_by(|p| p.as_path().cmp(path)).is_ok()
    }

    /// Number of duplicates (excluding the representative)
    pub fn duplicate_count(&self) -> usize {
        self.paths.len() - 1
    }

    /// Largest distance among the matches that formed the group
    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    /// Classification of the loosest match in the group
    pub fn match_type(&self) -> MatchType {
        self.match_type
    }

    /// Total size of the duplicates (excluding the representative)
    pub fn duplicate_size_bytes(&self) -> u64 {
        self.duplicate_size_bytes
    }

    pub(crate) fn set_duplicate_size_bytes(&mut self, bytes: u64) {
        self.duplicate_size_bytes = bytes;
    }
}
