//! Groups the fingerprints of one bucket into clusters.
//!
//! Two policies are available:
//!
//! - [`GroupingPolicy::UnionFind`] links every pair within the threshold
//!   and returns connected components. If A~B and B~C then {A, B, C} is
//!   one group even when A and C are far apart. The result does not
//!   depend on iteration order, and raising the threshold can only merge
//!   groups.
//! - [`GroupingPolicy::SeedLinkage`] takes the smallest unclustered
//!   fingerprint as a seed and pulls in every remaining member within the
//!   threshold of the seed itself. First match wins, so in an A~B~C chain
//!   the outcome depends on which item is seeded first. Members are
//!   always visited in ascending order to keep this reproducible.

use super::ThresholdStrategy;
use crate::core::hasher::{Fingerprint, PerceptualHash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How fingerprints inside a bucket are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupingPolicy {
    /// Connected components over all pairs within the threshold
    #[default]
    UnionFind,
    /// Greedy first-match-wins grouping around seeds
    SeedLinkage,
}

impl std::fmt::Display for GroupingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupingPolicy::UnionFind => write!(f, "union-find"),
            GroupingPolicy::SeedLinkage => write!(f, "seed-linkage"),
        }
    }
}

/// A pair of bucket members found within the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub distance: u32,
}

/// Result of grouping one bucket
#[derive(Debug, Default)]
pub struct BucketGrouping {
    /// Every member exactly once, singletons included. Each component is
    /// ascending and components are ordered by their first member.
    pub components: Vec<Vec<usize>>,
    /// The pairs that caused merges
    pub links: Vec<Link>,
}

/// Disjoint-set forest over `0..n`
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        // Path halving
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a == root_b {
            return;
        }
        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }
}

impl GroupingPolicy {
    /// Group the members of one bucket.
    ///
    /// `members` must be in the fixed iteration order (ascending
    /// fingerprint); indices in the result refer to positions in it.
    pub fn group(&self, members: &[&Fingerprint], threshold: &ThresholdStrategy) -> BucketGrouping {
        match self {
            GroupingPolicy::UnionFind => union_find(members, threshold),
            GroupingPolicy::SeedLinkage => seed_linkage(members, threshold),
        }
    }
}

fn union_find(members: &[&Fingerprint], threshold: &ThresholdStrategy) -> BucketGrouping {
    let n = members.len();
    let mut set = DisjointSet::new(n);
    let mut links = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let distance = members[i].distance(members[j]);
            if threshold.is_duplicate(distance) {
                links.push(Link { a: i, b: j, distance });
                set.union(i, j);
            }
        }
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    for i in 0..n {
        let root = set.find(i);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(i);
    }

    BucketGrouping { components, links }
}

fn seed_linkage(members: &[&Fingerprint], threshold: &ThresholdStrategy) -> BucketGrouping {
    let mut remaining: Vec<usize> = (0..members.len()).collect();
    let mut components = Vec::new();
    let mut links = Vec::new();

    while !remaining.is_empty() {
        let seed = remaining.remove(0);
        let mut component = vec![seed];

        remaining.retain(|&candidate| {
            let distance = members[seed].distance(members[candidate]);
            if threshold.is_duplicate(distance) {
                component.push(candidate);
                links.push(Link {
                    a: seed,
                    b: candidate,
                    distance,
                });
                false
            } else {
                true
            }
        });

        components.push(component);
    }

    BucketGrouping { components, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprints(values: &[u64]) -> Vec<Fingerprint> {
        values.iter().copied().map(Fingerprint::from_u64).collect()
    }

    fn threshold(value: u32) -> ThresholdStrategy {
        ThresholdStrategy::new(value, 64).unwrap()
    }

    /// A=0b000, B=0b011 (2 from A), C=0b1111 (2 from B, 4 from A)
    fn chain() -> Vec<Fingerprint> {
        fingerprints(&[0b0000, 0b0011, 0b1111])
    }

    #[test]
    fn empty_bucket() {
        let grouping = GroupingPolicy::UnionFind.group(&[], &threshold(5));
        assert!(grouping.components.is_empty());
        assert!(grouping.links.is_empty());
    }

    #[test]
    fn union_find_is_transitive() {
        let owned = chain();
        let refs: Vec<&Fingerprint> = owned.iter().collect();

        let grouping = GroupingPolicy::UnionFind.group(&refs, &threshold(2));

        assert_eq!(grouping.components, vec![vec![0, 1, 2]]);
        assert_eq!(grouping.links.len(), 2);
    }

    #[test]
    fn seed_linkage_only_joins_the_seed() {
        let owned = chain();
        let refs: Vec<&Fingerprint> = owned.iter().collect();

        let grouping = GroupingPolicy::SeedLinkage.group(&refs, &threshold(2));

        // A seeds and takes B; C is 4 from A so it starts its own group
        assert_eq!(grouping.components, vec![vec![0, 1], vec![2]]);
        assert_eq!(
            grouping.links,
            vec![Link {
                a: 0,
                b: 1,
                distance: 2
            }]
        );
    }

    #[test]
    fn far_apart_members_stay_singletons() {
        let owned = fingerprints(&[0, 0xFF, 0xFF00]);
        let refs: Vec<&Fingerprint> = owned.iter().collect();

        for policy in [GroupingPolicy::UnionFind, GroupingPolicy::SeedLinkage] {
            let grouping = policy.group(&refs, &threshold(3));
            assert_eq!(grouping.components, vec![vec![0], vec![1], vec![2]]);
        }
    }

    #[test]
    fn components_are_ordered_by_first_member() {
        // 0 and 2 are close, 1 is far from both
        let owned = fingerprints(&[0b0000, 0xF000, 0b0001]);
        let refs: Vec<&Fingerprint> = owned.iter().collect();

        for policy in [GroupingPolicy::UnionFind, GroupingPolicy::SeedLinkage] {
            let grouping = policy.group(&refs, &threshold(1));
            assert_eq!(grouping.components, vec![vec![0, 2], vec![1]]);
        }
    }

    #[test]
    fn union_find_merges_monotonically() {
        let owned = fingerprints(&[0b0000_0000, 0b0000_0011, 0b0011_1111, 0b1111_1111]);
        let refs: Vec<&Fingerprint> = owned.iter().collect();

        let mut previous = GroupingPolicy::UnionFind
            .group(&refs, &threshold(0))
            .components;
        for value in 1..=8 {
            let current = GroupingPolicy::UnionFind
                .group(&refs, &threshold(value))
                .components;
            for group in &previous {
                assert!(
                    current.iter().any(|c| group.iter().all(|m| c.contains(m))),
                    "group {:?} split at threshold {}",
                    group,
                    value
                );
            }
            previous = current;
        }
    }

    #[test]
    fn policy_display() {
        assert_eq!(GroupingPolicy::UnionFind.to_string(), "union-find");
        assert_eq!(GroupingPolicy::SeedLinkage.to_string(), "seed-linkage");
        assert_eq!(GroupingPolicy::default(), GroupingPolicy::UnionFind);
    }
}
