//! # Prefix Bucketing
//!
//! Avoids O(n²) comparison over the whole library by only comparing
//! fingerprints that share their leading bits.
//!
//! ## How It Works
//! 1. Take the top `prefix_bits` bits of each distinct fingerprint (16 by default)
//! 2. Use that value as a bucket key
//! 3. Compare pairs inside a bucket only
//!
//! ## Trade-offs
//! This is a heuristic. Two fingerprints within the threshold whose
//! differing bits fall inside the prefix land in different buckets and
//! are never compared, so the pair is missed. Fewer prefix bits means
//! fewer misses and larger buckets; zero bits puts everything in one
//! bucket and compares every pair.

use crate::core::hasher::Fingerprint;
use std::collections::BTreeMap;

/// Default number of leading bits used as the bucket key
pub const DEFAULT_BUCKET_BITS: u32 = 16;

/// Distinct fingerprints partitioned by their leading bits
#[derive(Debug)]
pub struct BucketIndex {
    /// Bucket key -> indices into the slice the index was built from
    buckets: BTreeMap<u64, Vec<usize>>,
}

impl BucketIndex {
    /// Partition `fingerprints` by prefix.
    ///
    /// Buckets iterate in ascending key order and keep the input order of
    /// their members, so sorted input gives sorted buckets.
    pub fn build(fingerprints: &[&Fingerprint], prefix_bits: u32) -> Self {
        let mut buckets: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (index, fingerprint) in fingerprints.iter().enumerate() {
            buckets
                .entry(fingerprint.prefix(prefix_bits))
                .or_default()
                .push(index);
        }
        Self { buckets }
    }

    /// Number of non-empty buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the index holds no fingerprints
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[usize])> + '_ {
        self.buckets.iter().map(|(key, members)| (*key, members.as_slice()))
    }

    /// Statistics about the index
    pub fn stats(&self) -> BucketStats {
        let members: usize = self.buckets.values().map(Vec::len).sum();
        let largest_bucket = self.buckets.values().map(Vec::len).max().unwrap_or(0);
        let comparisons = self
            .buckets
            .values()
            .map(|b| b.len() * b.len().saturating_sub(1) / 2)
            .sum();

        BucketStats {
            fingerprints: members,
            buckets: self.buckets.len(),
            largest_bucket,
            comparisons,
            naive_comparisons: members * members.saturating_sub(1) / 2,
        }
    }
}

/// Statistics about a [`BucketIndex`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketStats {
    /// Fingerprints indexed
    pub fingerprints: usize,
    /// Non-empty buckets
    pub buckets: usize,
    /// Size of the largest bucket
    pub largest_bucket: usize,
    /// Pairwise comparisons needed inside buckets
    pub comparisons: usize,
    /// Pairwise comparisons without bucketing
    pub naive_comparisons: usize,
}
