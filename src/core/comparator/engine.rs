//! The clustering phase: fingerprint map in, duplicate groups out.
//!
//! Runs on the calling thread. Buckets are processed in ascending key
//! order and fingerprints in ascending value order, so the same input
//! always produces the same partition no matter how the fingerprinting
//! phase was scheduled.

use super::{
    BucketIndex, DuplicateGroup, GroupingPolicy, ThresholdStrategy, DEFAULT_BUCKET_BITS,
    DEFAULT_THRESHOLD,
};
use crate::core::coordinator::CancellationToken;
use crate::core::hasher::{Fingerprint, PerceptualHash};
use crate::core::progress::ProgressReporter;
use crate::error::{CompareError, DedupError};
use crate::events::{null_sender, ClusterEvent, Event, EventSender, Phase};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Clustering settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Maximum Hamming distance between duplicates
    pub threshold: u32,
    /// Leading bits used as the bucket key (0 compares every pair)
    pub bucket_bits: u32,
    /// How each bucket is grouped
    pub policy: GroupingPolicy,
    /// Emit a `PairMatched` event for every match
    pub report_pairs: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            bucket_bits: DEFAULT_BUCKET_BITS,
            policy: GroupingPolicy::default(),
            report_pairs: false,
        }
    }
}

impl ClusterConfig {
    /// Check the settings against a fingerprint width and build the
    /// threshold they describe.
    ///
    /// The bucket prefix must leave at least one bit outside it: a prefix
    /// covering the whole fingerprint puts every distinct value in its own
    /// bucket, and only exact copies would ever be found.
    pub fn strategy(&self, bit_count: u32) -> Result<ThresholdStrategy, CompareError> {
        let max_bits = if bit_count > 64 {
            64
        } else {
            bit_count.saturating_sub(1)
        };
        if self.bucket_bits > max_bits {
            return Err(CompareError::InvalidBucketBits {
                bits: self.bucket_bits,
                max: max_bits,
            });
        }
        ThresholdStrategy::new(self.threshold, bit_count)
    }
}

/// Result of the clustering phase
#[derive(Debug, Default)]
pub struct ClusterOutput {
    /// Groups with at least two photos, in processing order
    pub groups: Vec<DuplicateGroup>,
    /// Number of photo pairs found within the threshold
    pub matched_pairs: usize,
    /// Cancellation was observed between buckets; `groups` is empty
    pub cancelled: bool,
}

/// Paths sharing one exact fingerprint, paths sorted
struct ExactClass<'a> {
    fingerprint: &'a Fingerprint,
    paths: Vec<&'a PathBuf>,
}

/// Groups fingerprints into duplicate clusters
pub struct ClusteringEngine {
    config: ClusterConfig,
}

impl ClusteringEngine {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    /// Cluster without progress reporting or cancellation
    pub fn cluster(
        &self,
        fingerprints: &HashMap<PathBuf, Fingerprint>,
    ) -> Result<ClusterOutput, DedupError> {
        self.cluster_with_events(
            fingerprints,
            &CancellationToken::new(),
            &mut ProgressReporter::new(),
            &null_sender(),
        )
    }

    /// Cluster, reporting progress on the [50, 100] slice and checking
    /// `cancel` before each bucket.
    pub fn cluster_with_events(
        &self,
        fingerprints: &HashMap<PathBuf, Fingerprint>,
        cancel: &CancellationToken,
        reporter: &mut ProgressReporter,
        events: &EventSender,
    ) -> Result<ClusterOutput, DedupError> {
        let bit_count = fingerprint_width(fingerprints)?;
        let strategy = self.config.strategy(bit_count)?;

        // Exact fast path: identical fingerprints never need comparing
        let mut by_fingerprint: BTreeMap<&Fingerprint, Vec<&PathBuf>> = BTreeMap::new();
        for (path, fingerprint) in fingerprints {
            by_fingerprint.entry(fingerprint).or_default().push(path);
        }
        let classes: Vec<ExactClass> = by_fingerprint
            .into_iter()
            .map(|(fingerprint, mut paths)| {
                paths.sort();
                ExactClass { fingerprint, paths }
            })
            .collect();

        let keys: Vec<&Fingerprint> = classes.iter().map(|c| c.fingerprint).collect();
        let index = BucketIndex::build(&keys, self.config.bucket_bits);
        let stats = index.stats();
        debug!(
            buckets = stats.buckets,
            largest_bucket = stats.largest_bucket,
            comparisons = stats.comparisons,
            naive_comparisons = stats.naive_comparisons,
            "bucket index built"
        );

        events.send(Event::Cluster(ClusterEvent::Started {
            fingerprints: fingerprints.len(),
            distinct: classes.len(),
            buckets: index.len(),
        }));
        // An empty index reports the end of the scale right away
        reporter.report(Phase::Clustering, 0, index.len(), events);

        let mut output = ClusterOutput::default();

        for (done, (_key, members)) in index.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(buckets_done = done, "clustering cancelled");
                return Ok(ClusterOutput {
                    cancelled: true,
                    ..Default::default()
                });
            }

            let member_keys: Vec<&Fingerprint> = members.iter().map(|&i| keys[i]).collect();
            let grouping = self.config.policy.group(&member_keys, &strategy);
            let class_of = |member: usize| &classes[members[member]];

            let mut component_of = vec![0usize; members.len()];
            for (slot, component) in grouping.components.iter().enumerate() {
                for &member in component {
                    component_of[member] = slot;
                }
            }

            let mut max_distance = vec![0u32; grouping.components.len()];
            for link in &grouping.links {
                let slot = component_of[link.a];
                max_distance[slot] = max_distance[slot].max(link.distance);
                output.matched_pairs += 1;
                if self.config.report_pairs {
                    self.send_pair(
                        events,
                        class_of(link.a).paths[0],
                        class_of(link.b).paths[0],
                        link.distance,
                    );
                }
            }

            for (slot, component) in grouping.components.iter().enumerate() {
                let mut paths = Vec::new();
                for &member in component {
                    let class = class_of(member);
                    let (first, rest) = (class.paths[0], &class.paths[1..]);
                    for &path in rest {
                        output.matched_pairs += 1;
                        if self.config.report_pairs {
                            self.send_pair(events, first, path, 0);
                        }
                    }
                    paths.extend(class.paths.iter().map(|p| (*p).clone()));
                }

                if let Some(group) = DuplicateGroup::new(paths, max_distance[slot]) {
                    output.groups.push(group);
                }
            }

            reporter.report(Phase::Clustering, done + 1, index.len(), events);
        }

        let duplicates = output.groups.iter().map(|g| g.duplicate_count()).sum();
        info!(
            groups = output.groups.len(),
            duplicates,
            policy = %self.config.policy,
            threshold = strategy.threshold(),
            "clustering finished"
        );
        events.send(Event::Cluster(ClusterEvent::Completed {
            groups: output.groups.len(),
            duplicates,
        }));

        Ok(output)
    }

    fn send_pair(&self, events: &EventSender, a: &Path, b: &Path, distance: u32) {
        events.send(Event::Cluster(ClusterEvent::PairMatched {
            path_a: a.to_path_buf(),
            path_b: b.to_path_buf(),
            distance,
        }));
    }
}

/// Common bit width of all fingerprints (64 when there are none)
fn fingerprint_width(fingerprints: &HashMap<PathBuf, Fingerprint>) -> Result<u32, DedupError> {
    let mut widths = fingerprints.values().map(|f| f.bit_count());
    let Some(first) = widths.next() else {
        return Ok(64);
    };
    if widths.any(|w| w != first) {
        return Err(DedupError::Config(
            "fingerprints of different widths cannot be compared".to_string(),
        ));
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;

    fn map(entries: &[(&str, u64)]) -> HashMap<PathBuf, Fingerprint> {
        entries
            .iter()
            .map(|(path, value)| (PathBuf::from(path), Fingerprint::from_u64(*value)))
            .collect()
    }

    fn engine(threshold: u32) -> ClusteringEngine {
        ClusteringEngine::new(ClusterConfig {
            threshold,
            ..Default::default()
        })
    }

    fn memberships(output: &ClusterOutput) -> Vec<Vec<String>> {
        output
            .groups
            .iter()
            .map(|g| g.paths().iter().map(|p| p.display().to_string()).collect())
            .collect()
    }

    #[test]
    fn empty_map_has_no_groups() {
        let output = engine(5).cluster(&HashMap::new()).unwrap();
        assert!(output.groups.is_empty());
        assert!(!output.cancelled);
    }

    #[test]
    fn identical_fingerprints_form_one_group_at_zero_threshold() {
        let fingerprints = map(&[("/d.jpg", 7), ("/b.jpg", 7), ("/a.jpg", 7), ("/c.jpg", 7)]);

        let output = engine(0).cluster(&fingerprints).unwrap();

        assert_eq!(memberships(&output), vec![vec!["/a.jpg", "/b.jpg", "/c.jpg", "/d.jpg"]]);
        assert_eq!(output.groups[0].max_distance(), 0);
        assert_eq!(output.matched_pairs, 3);
    }

    #[test]
    fn distant_fingerprints_are_all_singletons() {
        let fingerprints = map(&[
            ("/a.jpg", 0x0000_0000_0000_0000),
            ("/b.jpg", 0x0000_0000_0000_FFFF),
            ("/c.jpg", 0x0000_0000_FFFF_0000),
        ]);

        let output = engine(5).cluster(&fingerprints).unwrap();

        assert!(output.groups.is_empty());
    }

    #[test]
    fn near_duplicates_in_same_bucket_are_grouped() {
        let fingerprints = map(&[
            ("/a.jpg", 0x1234_0000_0000_0000),
            ("/b.jpg", 0x1234_0000_0000_0007), // 3 bits from a
            ("/c.jpg", 0x9999_0000_0000_0000),
        ]);

        let output = engine(5).cluster(&fingerprints).unwrap();

        assert_eq!(memberships(&output), vec![vec!["/a.jpg", "/b.jpg"]]);
        assert_eq!(output.groups[0].max_distance(), 3);
    }

    #[test]
    fn exact_and_near_duplicates_share_a_group() {
        let fingerprints = map(&[
            ("/a.jpg", 0x1234_0000_0000_0000),
            ("/a-copy.jpg", 0x1234_0000_0000_0000),
            ("/b.jpg", 0x1234_0000_0000_0001),
        ]);

        let output = engine(2).cluster(&fingerprints).unwrap();

        assert_eq!(
            memberships(&output),
            vec![vec!["/a-copy.jpg", "/a.jpg", "/b.jpg"]]
        );
    }

    #[test]
    fn differences_in_bucket_prefix_are_missed() {
        // One bit apart, but that bit is inside the 16-bit prefix
        let fingerprints = map(&[("/a.jpg", 0x0000_0000_0000_0000), ("/b.jpg", 0x8000_0000_0000_0000)]);

        let bucketed = engine(5).cluster(&fingerprints).unwrap();
        assert!(bucketed.groups.is_empty());

        let unbucketed = ClusteringEngine::new(ClusterConfig {
            threshold: 5,
            bucket_bits: 0,
            ..Default::default()
        })
        .cluster(&fingerprints)
        .unwrap();
        assert_eq!(unbucketed.groups.len(), 1);
    }

    #[test]
    fn seed_linkage_resolves_triangle_by_seed_order() {
        // a~b (2), b~c (2), a and c 4 apart; all in one bucket
        let fingerprints = map(&[("/a.jpg", 0b0000), ("/b.jpg", 0b0011), ("/c.jpg", 0b1111)]);

        let greedy = ClusteringEngine::new(ClusterConfig {
            threshold: 2,
            policy: GroupingPolicy::SeedLinkage,
            ..Default::default()
        })
        .cluster(&fingerprints)
        .unwrap();
        assert_eq!(memberships(&greedy), vec![vec!["/a.jpg", "/b.jpg"]]);

        let components = engine(2).cluster(&fingerprints).unwrap();
        assert_eq!(
            memberships(&components),
            vec![vec!["/a.jpg", "/b.jpg", "/c.jpg"]]
        );
    }

    #[test]
    fn output_is_reproducible() {
        let entries: Vec<(String, u64)> = (0..200u64)
            .map(|i| (format!("/p{:03}.jpg", i), (i % 17) << 3 | (i % 3)))
            .collect();
        let refs: Vec<(&str, u64)> = entries.iter().map(|(p, v)| (p.as_str(), *v)).collect();

        let first = memberships(&engine(2).cluster(&map(&refs)).unwrap());
        let second = memberships(&engine(2).cluster(&map(&refs)).unwrap());

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn every_path_appears_at_most_once() {
        let entries: Vec<(String, u64)> = (0..100u64)
            .map(|i| (format!("/p{:03}.jpg", i), i.wrapping_mul(0x9E37_79B9) & 0xFF))
            .collect();
        let refs: Vec<(&str, u64)> = entries.iter().map(|(p, v)| (p.as_str(), *v)).collect();

        for policy in [GroupingPolicy::UnionFind, GroupingPolicy::SeedLinkage] {
            let output = ClusteringEngine::new(ClusterConfig {
                threshold: 3,
                policy,
                ..Default::default()
            })
            .cluster(&map(&refs))
            .unwrap();

            let mut seen = std::collections::HashSet::new();
            for group in &output.groups {
                assert!(group.len() >= 2);
                for path in group.paths() {
                    assert!(seen.insert(path.clone()), "{} in two groups", path.display());
                }
            }
        }
    }

    #[test]
    fn invalid_threshold_is_rejected() {
        let fingerprints = map(&[("/a.jpg", 1)]);
        let result = engine(65).cluster(&fingerprints);
        assert!(matches!(
            result,
            Err(DedupError::Compare(CompareError::InvalidThreshold { value: 65, max: 64 }))
        ));
    }

    #[test]
    fn bucket_bits_must_leave_bits_outside_the_prefix() {
        let config = ClusterConfig {
            bucket_bits: 64,
            ..Default::default()
        };
        assert_eq!(
            config.strategy(64).unwrap_err(),
            CompareError::InvalidBucketBits { bits: 64, max: 63 }
        );
        assert!(config.strategy(256).is_ok());
        assert!(ClusterConfig::default().strategy(64).is_ok());
        assert!(ClusterConfig::default().strategy(17).is_ok());
    }

    #[test]
    fn default_prefix_on_16_bit_fingerprints_is_rejected() {
        // These differ by one bit; a 16 bit prefix would bucket them apart
        let fingerprints: HashMap<PathBuf, Fingerprint> = [
            (PathBuf::from("/a.jpg"), Fingerprint::from_bytes(&[0x00, 0x00])),
            (PathBuf::from("/b.jpg"), Fingerprint::from_bytes(&[0x00, 0x01])),
        ]
        .into_iter()
        .collect();

        let result = ClusteringEngine::new(ClusterConfig::default()).cluster(&fingerprints);
        assert!(matches!(
            result,
            Err(DedupError::Compare(CompareError::InvalidBucketBits { bits: 16, max: 15 }))
        ));

        let narrow = ClusteringEngine::new(ClusterConfig {
            bucket_bits: 4,
            ..Default::default()
        });
        let output = narrow.cluster(&fingerprints).unwrap();
        assert_eq!(output.groups.len(), 1);
        assert_eq!(output.groups[0].len(), 2);
    }

    #[test]
    fn mixed_widths_are_rejected() {
        let mut fingerprints = map(&[("/a.jpg", 1)]);
        fingerprints.insert(PathBuf::from("/b.jpg"), Fingerprint::from_bytes(&[0; 32]));
        assert!(matches!(engine(5).cluster(&fingerprints), Err(DedupError::Config(_))));
    }

    #[test]
    fn cancellation_between_buckets_discards_groups() {
        let fingerprints = map(&[("/a.jpg", 1), ("/b.jpg", 1)]);
        let token = CancellationToken::new();
        token.cancel();

        let output = engine(5)
            .cluster_with_events(&fingerprints, &token, &mut ProgressReporter::new(), &null_sender())
            .unwrap();

        assert!(output.cancelled);
        assert!(output.groups.is_empty());
    }

    #[test]
    fn reports_pairs_and_progress_when_asked() {
        let fingerprints = map(&[
            ("/a.jpg", 0x0001_0000_0000_0000),
            ("/a2.jpg", 0x0001_0000_0000_0000),
            ("/b.jpg", 0x0001_0000_0000_0001),
            ("/z.jpg", 0xFFFF_0000_0000_0000),
        ]);
        let (sender, receiver) = EventChannel::new();

        ClusteringEngine::new(ClusterConfig {
            threshold: 1,
            report_pairs: true,
            ..Default::default()
        })
        .cluster_with_events(
            &fingerprints,
            &CancellationToken::new(),
            &mut ProgressReporter::new(),
            &sender,
        )
        .unwrap();
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        let pairs: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Cluster(ClusterEvent::PairMatched {
                    path_a,
                    path_b,
                    distance,
                }) => Some((path_a.clone(), path_b.clone(), *distance)),
                _ => None,
            })
            .collect();

        assert!(pairs.contains(&(PathBuf::from("/a.jpg"), PathBuf::from("/b.jpg"), 1)));
        assert!(pairs.contains(&(PathBuf::from("/a.jpg"), PathBuf::from("/a2.jpg"), 0)));

        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(p.percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents.first(), Some(&50));
        assert_eq!(percents.last(), Some(&100));
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
    }
}
