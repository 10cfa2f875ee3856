//! Run execution: fingerprint, then cluster.

use crate::core::candidate::ImageCandidate;
use crate::core::comparator::{ClusterConfig, ClusteringEngine, DuplicateGroup, GroupingPolicy};
use crate::core::coordinator::{
    CancellationToken, CoordinatorConfig, FailedItem, WorkCoordinator,
};
use crate::core::hasher::{FingerprintAlgorithm, HasherConfig};
use crate::core::progress::ProgressReporter;
use crate::error::DedupError;
use crate::events::{null_sender, Event, EventSender, RunEvent, RunSummary};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Result of a run
#[derive(Debug, Default)]
pub struct ClusterResult {
    /// Duplicate groups, never singletons. Empty if the run was cancelled.
    pub groups: Vec<DuplicateGroup>,
    /// Distinct candidate paths supplied
    pub total_candidates: usize,
    /// Candidates that produced a fingerprint
    pub fingerprinted: usize,
    /// Candidates that failed, see `failures`
    pub failed: usize,
    /// Cancellation was observed; groups were not computed
    pub cancelled: bool,
    /// One entry per failed candidate, sorted by path
    pub failures: Vec<FailedItem>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl ClusterResult {
    /// Photos that could be removed, keeping one per group
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.duplicate_count()).sum()
    }

    /// Bytes freed by removing every duplicate
    pub fn potential_savings_bytes(&self) -> u64 {
        self.groups.iter().map(|g| g.duplicate_size_bytes()).sum()
    }

    /// Counters for the run-completed event
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total_candidates: self.total_candidates,
            fingerprinted: self.fingerprinted,
            failed: self.failed,
            duplicate_groups: self.groups.len(),
            duplicate_count: self.duplicate_count(),
            potential_savings_bytes: self.potential_savings_bytes(),
            duration_ms: self.duration_ms,
        }
    }
}

/// Builder for [`DuplicateFinder`]
#[derive(Default)]
pub struct DuplicateFinderBuilder {
    hasher: HasherConfig,
    cluster: ClusterConfig,
    coordinator: CoordinatorConfig,
    algorithm: Option<Box<dyn FingerprintAlgorithm>>,
}

impl DuplicateFinderBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the comparison threshold (lower = stricter)
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.cluster.threshold = threshold;
        self
    }

    /// Cap the number of workers (0 = automatic)
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.coordinator.concurrency = workers;
        self
    }

    /// Per-photo time budget
    pub fn item_timeout(mut self, timeout: Duration) -> Self {
        self.coordinator.item_timeout = timeout;
        self
    }

    /// Replace the hasher configuration
    pub fn hasher(mut self, config: HasherConfig) -> Self {
        self.hasher = config;
        self
    }

    /// Set the dHash grid size
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hasher = self.hasher.hash_size(size);
        self
    }

    /// Leading bits used to bucket fingerprints (0 compares every pair)
    pub fn bucket_bits(mut self, bits: u32) -> Self {
        self.cluster.bucket_bits = bits;
        self
    }

    /// Set the grouping policy
    pub fn policy(mut self, policy: GroupingPolicy) -> Self {
        self.cluster.policy = policy;
        self
    }

    /// Emit an event for every matched pair
    pub fn report_pairs(mut self, enabled: bool) -> Self {
        self.cluster.report_pairs = enabled;
        self
    }

    /// Use a custom fingerprint algorithm instead of the configured hasher
    pub fn algorithm(mut self, algorithm: Box<dyn FingerprintAlgorithm>) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Build the finder. Settings are validated when a run starts.
    pub fn build(self) -> DuplicateFinder {
        DuplicateFinder {
            hasher: self.hasher,
            cluster: self.cluster,
            coordinator: self.coordinator,
            algorithm: self.algorithm,
        }
    }
}

/// The duplicate detection engine.
///
/// Holds configuration only. Each run builds its own worker pool and
/// progress state, so one finder can serve runs one after another.
pub struct DuplicateFinder {
    hasher: HasherConfig,
    cluster: ClusterConfig,
    coordinator: CoordinatorConfig,
    algorithm: Option<Box<dyn FingerprintAlgorithm>>,
}

impl DuplicateFinder {
    /// Create a new builder
    pub fn builder() -> DuplicateFinderBuilder {
        DuplicateFinderBuilder::new()
    }

    /// Clustering settings in effect
    pub fn cluster_config(&self) -> &ClusterConfig {
        &self.cluster
    }

    /// Run without events
    pub fn run(
        &self,
        candidates: &[ImageCandidate],
        cancel: &CancellationToken,
    ) -> Result<ClusterResult, DedupError> {
        self.run_with_events(candidates, cancel, &null_sender())
    }

    /// Run with event reporting.
    ///
    /// Invalid settings fail before any work starts. Per-photo failures
    /// never fail the run; they are counted in the result.
    pub fn run_with_events(
        &self,
        candidates: &[ImageCandidate],
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<ClusterResult, DedupError> {
        let start_time = Instant::now();

        let default_hasher;
        let algorithm: &dyn FingerprintAlgorithm = match &self.algorithm {
            Some(custom) => custom.as_ref(),
            None => {
                default_hasher = self.hasher.clone().build()?;
                &default_hasher
            }
        };
        let strategy = self.cluster.strategy(algorithm.bit_count())?;

        events.send(Event::Run(RunEvent::Started {
            candidates: candidates.len(),
        }));
        info!(
            candidates = candidates.len(),
            threshold = strategy.threshold(),
            policy = %self.cluster.policy,
            "run started"
        );

        let mut reporter = ProgressReporter::new();

        // Phase 1: fingerprinting
        let coordinator = WorkCoordinator::new(algorithm, self.coordinator);
        let outcome = coordinator.run(candidates, cancel, &mut reporter, events)?;

        let mut result = ClusterResult {
            total_candidates: outcome.total,
            fingerprinted: outcome.fingerprints.len(),
            failed: outcome.failed(),
            ..Default::default()
        };

        if outcome.cancelled {
            return Ok(self.cancelled(result, outcome.failures, start_time, events));
        }

        // Phase 2: clustering
        let engine = ClusteringEngine::new(self.cluster);
        let output =
            engine.cluster_with_events(&outcome.fingerprints, cancel, &mut reporter, events)?;
        if output.cancelled {
            return Ok(self.cancelled(result, outcome.failures, start_time, events));
        }

        // Sizes are only looked up for photos that ended up in a group
        let by_path: HashMap<&Path, &ImageCandidate> =
            candidates.iter().map(|c| (c.path(), c)).collect();
        let mut groups = output.groups;
        for group in &mut groups {
            let total_size: u64 = group.paths()[1..]
                .iter()
                .filter_map(|p| by_path.get(p.as_path()))
                .filter_map(|c| c.size())
                .sum();
            group.set_duplicate_size_bytes(total_size);
        }

        result.groups = groups;
        result.failures = outcome.failures;
        result.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            groups = result.groups.len(),
            duplicates = result.duplicate_count(),
            failed = result.failed,
            duration_ms = result.duration_ms,
            "run finished"
        );
        events.send(Event::Run(RunEvent::Completed {
            summary: result.summary(),
        }));

        Ok(result)
    }

    fn cancelled(
        &self,
        mut result: ClusterResult,
        failures: Vec<FailedItem>,
        start_time: Instant,
        events: &EventSender,
    ) -> ClusterResult {
        result.cancelled = true;
        result.failures = failures;
        result.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(fingerprinted = result.fingerprinted, "run cancelled");
        events.send(Event::Run(RunEvent::Cancelled {
            fingerprinted: result.fingerprinted,
        }));
        result
    }
}
