//! Event type definitions for progress reporting.

use crate::error::FailureKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted during a duplicate detection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Overall progress on the shared 0-100 scale
    Progress(ProgressUpdate),
    /// Fingerprinting phase events
    Fingerprint(FingerprintEvent),
    /// Clustering phase events
    Cluster(ClusterEvent),
    /// Run-level events
    Run(RunEvent),
}

/// The two phases that share the progress scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Computing fingerprints, reported in [0, 50)
    Fingerprinting,
    /// Grouping fingerprints, reported in [50, 100]
    Clustering,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Fingerprinting => write!(f, "Fingerprinting"),
            Phase::Clustering => write!(f, "Clustering"),
        }
    }
}

/// A throttled progress update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Overall percentage, 0..=100
    pub percent: u8,
    /// Phase that produced this update
    pub phase: Phase,
}

/// Events during the fingerprinting phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started { total: usize, workers: usize },
    /// A photo could not be fingerprinted; the batch continues
    ItemFailed {
        path: PathBuf,
        kind: FailureKind,
        message: String,
    },
    /// Fingerprinting finished (or stopped after cancellation)
    Completed { fingerprinted: usize, failed: usize },
}

/// Events during the clustering phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// Clustering has started
    Started {
        fingerprints: usize,
        distinct: usize,
        buckets: usize,
    },
    /// Two photos were found within the threshold
    PairMatched {
        path_a: PathBuf,
        path_b: PathBuf,
        distance: u32,
    },
    /// Clustering completed
    Completed { groups: usize, duplicates: usize },
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    /// The run has started
    Started { candidates: usize },
    /// Cancellation was observed; clustering will not run
    Cancelled { fingerprinted: usize },
    /// The run completed
    Completed { summary: RunSummary },
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Distinct candidates supplied by the caller
    pub total_candidates: usize,
    /// Candidates that produced a fingerprint
    pub fingerprinted: usize,
    /// Candidates that failed
    pub failed: usize,
    /// Number of duplicate groups found
    pub duplicate_groups: usize,
    /// Total number of duplicate photos (excluding representatives)
    pub duplicate_count: usize,
    /// Potential space savings in bytes
    pub potential_savings_bytes: u64,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
