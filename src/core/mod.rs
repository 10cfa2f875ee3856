//! # Core Module
//!
//! The UI-agnostic duplicate detection engine.
//!
//! ## Modules
//! - `candidate` - Paths handed in by the caller
//! - `hasher` - Computes perceptual fingerprints
//! - `coordinator` - Fingerprints candidates on a bounded worker pool
//! - `comparator` - Clusters fingerprints into duplicate groups
//! - `progress` - Maps both phases onto one percentage scale
//! - `pipeline` - Orchestrates the full workflow

pub mod candidate;
pub mod comparator;
pub mod coordinator;
pub mod hasher;
pub mod pipeline;
pub mod progress;

// Re-export commonly used types
pub use candidate::ImageCandidate;
pub use comparator::{DuplicateGroup, GroupingPolicy, MatchType};
pub use hasher::{Fingerprint, PerceptualHash};
pub use pipeline::{CancellationToken, ClusterResult, DuplicateFinder};
