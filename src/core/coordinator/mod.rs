//! # Coordinator Module
//!
//! Runs fingerprinting over every candidate on a bounded worker pool.
//!
//! ## Concurrency Model
//! - The pool is a rayon `ThreadPool` built for this run and dropped at
//!   its end; there is no process-wide pool.
//! - Pool size is `min(candidates, cores, 8)`, optionally lowered by the
//!   caller's concurrency hint.
//! - Workers pull the next index from a shared counter and send their
//!   result back over a channel. Only the calling thread touches the
//!   aggregate map, so no lock is held while decoding.
//! - Cancellation is checked before each new item. In-flight items finish
//!   and their results are kept.

mod cancel;

pub use cancel::CancellationToken;

use crate::core::candidate::ImageCandidate;
use crate::core::hasher::{Fingerprint, FingerprintAlgorithm};
use crate::core::progress::ProgressReporter;
use crate::error::{DedupError, FailureKind, FingerprintError};
use crate::events::{Event, EventSender, FingerprintEvent, Phase};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on fingerprinting threads regardless of core count
pub const MAX_WORKERS: usize = 8;

/// Default soft time budget per photo
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(30);

/// A photo that could not be fingerprinted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

impl From<&FingerprintError> for FailedItem {
    fn from(error: &FingerprintError) -> Self {
        Self {
            path: error.path().to_path_buf(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Everything the fingerprinting phase produced
#[derive(Debug, Default)]
pub struct FingerprintOutcome {
    /// Distinct candidates considered
    pub total: usize,
    /// One fingerprint per successfully processed path
    pub fingerprints: HashMap<PathBuf, Fingerprint>,
    /// Per-item failures, sorted by path
    pub failures: Vec<FailedItem>,
    /// Whether cancellation was observed
    pub cancelled: bool,
}

impl FingerprintOutcome {
    /// Number of failed candidates
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Coordinator settings
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Caller's concurrency hint; 0 means "as many as allowed"
    pub concurrency: usize,
    /// Soft time budget per photo.
    ///
    /// Checked only after the photo finishes: a slower photo is recorded
    /// as a timeout, but a decoder that never returns is not interrupted
    /// and holds its worker. Cancellation cannot interrupt it either.
    pub item_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 0,
            item_timeout: DEFAULT_ITEM_TIMEOUT,
        }
    }
}

/// Number of worker threads for a batch of `candidates`
pub fn worker_count(candidates: usize, hint: usize) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let workers = candidates.min(cores).min(MAX_WORKERS);
    if hint > 0 {
        workers.min(hint)
    } else {
        workers
    }
}

/// Drives a [`FingerprintAlgorithm`] over a batch of candidates
pub struct WorkCoordinator<'a> {
    algorithm: &'a dyn FingerprintAlgorithm,
    config: CoordinatorConfig,
}

impl<'a> WorkCoordinator<'a> {
    pub fn new(algorithm: &'a dyn FingerprintAlgorithm, config: CoordinatorConfig) -> Self {
        Self { algorithm, config }
    }

    /// Fingerprint one photo, enforcing the soft time budget.
    ///
    /// The budget is checked once the item finishes: a slow photo is
    /// recorded as a timeout, it is never interrupted.
    fn compute(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.algorithm.fingerprint_file(path)))
            .unwrap_or_else(|_| {
                Err(FingerprintError::UnreadableFile {
                    path: path.to_path_buf(),
                    reason: "decoder panicked".to_string(),
                })
            });

        let elapsed = started.elapsed();
        if elapsed > self.config.item_timeout {
            return Err(FingerprintError::Timeout {
                path: path.to_path_buf(),
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.config.item_timeout.as_millis() as u64,
            });
        }
        result
    }

    /// Fingerprint every candidate.
    ///
    /// Repeated paths are processed once. Per-item failures are collected
    /// in the outcome; only a failure to build the worker pool is an error.
    pub fn run(
        &self,
        candidates: &[ImageCandidate],
        cancel: &CancellationToken,
        reporter: &mut ProgressReporter,
        events: &EventSender,
    ) -> Result<FingerprintOutcome, DedupError> {
        let mut seen = HashSet::with_capacity(candidates.len());
        let unique: Vec<&Path> = candidates
            .iter()
            .map(|c| c.path())
            .filter(|p| seen.insert(*p))
            .collect();

        let total = unique.len();
        if total < candidates.len() {
            debug!(
                repeated = candidates.len() - total,
                "ignoring repeated candidate paths"
            );
        }

        let workers = worker_count(total, self.config.concurrency);
        events.send(Event::Fingerprint(FingerprintEvent::Started { total, workers }));
        reporter.report(Phase::Fingerprinting, 0, total, events);

        let mut outcome = FingerprintOutcome {
            total,
            fingerprints: HashMap::with_capacity(total),
            ..Default::default()
        };

        if total == 0 {
            outcome.cancelled = cancel.is_cancelled();
            events.send(Event::Fingerprint(FingerprintEvent::Completed {
                fingerprinted: 0,
                failed: 0,
            }));
            return Ok(outcome);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fingerprint-{}", i))
            .build()
            .map_err(|e| DedupError::Fatal(format!("failed to build worker pool: {}", e)))?;

        info!(total, workers, "fingerprinting started");

        let next = AtomicUsize::new(0);
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut completed = 0usize;

        pool.in_place_scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                let unique = &unique;
                scope.spawn(move |_| loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = unique.get(index) else {
                        break;
                    };
                    let result = self.compute(path);
                    if tx.send((index, result)).is_err() {
                        break;
                    }
                });
            }
            // Workers hold the remaining senders; the loop ends when all exit
            drop(tx);

            for (index, result) in rx.iter() {
                completed += 1;
                match result {
                    Ok(fingerprint) => {
                        outcome
                            .fingerprints
                            .insert(unique[index].to_path_buf(), fingerprint);
                    }
                    Err(error) => {
                        warn!(path = %error.path().display(), kind = %error.kind(), "{}", error);
                        let item = FailedItem::from(&error);
                        events.send(Event::Fingerprint(FingerprintEvent::ItemFailed {
                            path: item.path.clone(),
                            kind: item.kind,
                            message: item.message.clone(),
                        }));
                        outcome.failures.push(item);
                    }
                }
                reporter.report(Phase::Fingerprinting, completed, total, events);
            }
        });

        outcome.failures.sort_by(|a, b| a.path.cmp(&b.path));
        outcome.cancelled = cancel.is_cancelled();

        info!(
            fingerprinted = outcome.fingerprints.len(),
            failed = outcome.failed(),
            skipped = total - completed,
            cancelled = outcome.cancelled,
            "fingerprinting finished"
        );
        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            fingerprinted: outcome.fingerprints.len(),
            failed: outcome.failed(),
        }));

        Ok(outcome)
    }
}
