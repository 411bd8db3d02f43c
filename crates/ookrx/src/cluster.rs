//! Tolerance-based clustering of pulse durations
//!
//! Raw pulse durations jitter around a handful of nominal timing
//! values chosen by the transmitter. The "guess and grow" pass groups
//! the observed durations into non-overlapping timing classes without
//! knowing the nominal values in advance: seed a cluster at the median
//! of the unclaimed pool, widen it by a fractional tolerance until it
//! stops absorbing neighbors, carve it out of the pool, and repeat.

#[cfg(not(test))]
use log::debug;

#[cfg(test)]
use std::println as debug;

use thiserror::Error;

/// Error constructing a [`ClusterSet`]
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClusterError {
    /// No durations were provided
    #[error("cannot cluster an empty duration set")]
    Empty,
}

/// One contiguous range of observed durations
///
/// `min` and `max` are inclusive bounds over the durations this
/// cluster absorbed. `sum` and `sum2` are running statistics over the
/// absorbed values, kept for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterDescription {
    min: u32,
    max: u32,
    count: usize,
    sum: u64,
    sum2: u64,
}

impl ClusterDescription {
    /// Smallest absorbed duration (inclusive)
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Largest absorbed duration (inclusive)
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of durations absorbed
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the absorbed durations
    pub fn mean(&self) -> u32 {
        (self.sum / self.count as u64) as u32
    }

    /// True if `duration` falls within `[min, max]`
    pub fn contains(&self, duration: u32) -> bool {
        duration >= self.min && duration <= self.max
    }

    /// Combine two clusters into one covering both
    fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            count: self.count + other.count,
            sum: self.sum + other.sum,
            sum2: self.sum2 + other.sum2,
        }
    }
}

/// An ordered set of non-overlapping timing classes
///
/// Built by [`guess_and_grow()`](ClusterSet::guess_and_grow). The
/// clusters are sorted by ascending `min`, are pairwise disjoint, and
/// jointly cover every duration used to build the set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterSet {
    clusters: Vec<ClusterDescription>,
}

impl ClusterSet {
    /// Cluster `durations` into timing classes
    ///
    /// `tolerance` is the fractional slack used when deciding whether
    /// a neighboring duration belongs to a growing cluster: a cluster
    /// spanning `[min, max]` may absorb pool values down to
    /// `floor(min·(1−tolerance))` and up to `ceil(max·(1+tolerance))`.
    /// Growth repeats from the new boundaries until a pass absorbs
    /// nothing, so the result does not depend on the input ordering.
    pub fn guess_and_grow(durations: &[u32], tolerance: f64) -> Result<Self, ClusterError> {
        if durations.is_empty() {
            return Err(ClusterError::Empty);
        }

        let mut pool: Vec<u32> = durations.to_vec();
        pool.sort_unstable();

        let mut clusters = Vec::new();
        while !pool.is_empty() {
            let center = pool.len() / 2;
            let mut left = center;
            let mut right = center;
            let mut sum = u64::from(pool[center]);
            let mut sum2 = u64::from(pool[center]) * u64::from(pool[center]);

            // widen until a full pass absorbs no new elements
            loop {
                let before = right - left + 1;
                let lo = (f64::from(pool[left]) * (1.0 - tolerance)).floor() as u32;
                let hi = (f64::from(pool[right]) * (1.0 + tolerance)).ceil() as u32;

                while left > 0 && pool[left - 1] >= lo {
                    left -= 1;
                    sum += u64::from(pool[left]);
                    sum2 += u64::from(pool[left]) * u64::from(pool[left]);
                }
                while right + 1 < pool.len() && pool[right + 1] <= hi {
                    right += 1;
                    sum += u64::from(pool[right]);
                    sum2 += u64::from(pool[right]) * u64::from(pool[right]);
                }

                if right - left + 1 == before {
                    break;
                }
            }

            let cluster = ClusterDescription {
                min: pool[left],
                max: pool[right],
                count: right - left + 1,
                sum,
                sum2,
            };
            debug!(
                "cluster {}..{} count={} mean={}",
                cluster.min,
                cluster.max,
                cluster.count,
                cluster.mean()
            );
            clusters.push(cluster);
            pool.drain(left..=right);
        }

        clusters.sort_unstable_by_key(|c| c.min);
        Ok(Self { clusters })
    }

    /// Absorb a single leading outlier into its neighbor
    ///
    /// A transmission often starts with one runt pulse, a startup
    /// glitch whose duration lands in a singleton cluster of its own.
    /// If a singleton cluster whose `min` equals `first_duration` has
    /// a next-larger neighbor, merge the two. At most one merge is
    /// performed; anything else passes through unchanged.
    pub fn fold_leading_runt(mut self, first_duration: u32) -> Self {
        if self.clusters.len() < 2 {
            return self;
        }

        for i in 0..self.clusters.len() {
            if self.clusters[i].min > first_duration {
                break;
            }
            if self.clusters[i].count == 1
                && self.clusters[i].min == first_duration
                && i + 1 < self.clusters.len()
            {
                self.clusters[i] = self.clusters[i].merge(&self.clusters[i + 1]);
                self.clusters.remove(i + 1);
                break;
            }
        }
        self
    }

    /// First cluster whose range contains `duration`, if any
    pub fn lookup(&self, duration: u32) -> Option<&ClusterDescription> {
        self.clusters.iter().find(|c| c.contains(duration))
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if the set holds no clusters
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Clusters in ascending `min` order
    pub fn iter(&self) -> std::slice::Iter<'_, ClusterDescription> {
        self.clusters.iter()
    }

    /// Cluster at `index`, if present
    pub fn get(&self, index: usize) -> Option<&ClusterDescription> {
        self.clusters.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 0.2;

    // every input duration must land in exactly one cluster, and the
    // cluster ranges must be sorted and pairwise disjoint
    fn assert_partition(set: &ClusterSet, durations: &[u32]) {
        for pair in set.clusters.windows(2) {
            assert!(pair[0].min <= pair[0].max);
            assert!(pair[0].max < pair[1].min, "overlapping ranges: {:?}", pair);
        }

        let total: usize = set.iter().map(|c| c.count()).sum();
        assert_eq!(total, durations.len());

        for &d in durations {
            let homes = set.iter().filter(|c| c.contains(d)).count();
            assert_eq!(homes, 1, "duration {} found in {} clusters", d, homes);
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            ClusterSet::guess_and_grow(&[], TOLERANCE),
            Err(ClusterError::Empty)
        );
    }

    #[test]
    fn test_single_element() {
        let set = ClusterSet::guess_and_grow(&[440], TOLERANCE).unwrap();
        assert_eq!(set.len(), 1);
        let only = set.get(0).unwrap();
        assert_eq!((only.min(), only.max(), only.count()), (440, 440, 1));
        assert_eq!(only.mean(), 440);
    }

    #[test]
    fn test_partition_property() {
        let durations = [
            95, 102, 99, 104, 100, 98, 201, 198, 205, 199, 1002, 97, 100, 202,
        ];
        let set = ClusterSet::guess_and_grow(&durations, TOLERANCE).unwrap();
        assert_partition(&set, &durations);
        assert_eq!(set.len(), 3);

        let short = set.get(0).unwrap();
        assert_eq!((short.min(), short.max()), (95, 104));
        assert_eq!(short.count(), 8);

        let long = set.get(1).unwrap();
        assert_eq!((long.min(), long.max()), (198, 205));
        assert_eq!(long.count(), 5);

        let end = set.get(2).unwrap();
        assert_eq!(end.count(), 1);
    }

    #[test]
    fn test_order_independence() {
        let forward = [100, 105, 95, 210, 190, 200, 995, 1010];
        let mut backward = forward;
        backward.reverse();

        let a = ClusterSet::guess_and_grow(&forward, TOLERANCE).unwrap();
        let b = ClusterSet::guess_and_grow(&backward, TOLERANCE).unwrap();
        assert_eq!(a, b);
        assert_partition(&a, &forward);
    }

    #[test]
    fn test_growth_reaches_fixed_point() {
        // each value is within tolerance of its neighbor, so repeated
        // growth passes must chain them all into one cluster
        let durations = [100, 118, 140, 165, 195];
        let set = ClusterSet::guess_and_grow(&durations, TOLERANCE).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0).unwrap().count(), 5);
        assert_partition(&set, &durations);
    }

    #[test]
    fn test_lookup() {
        let set = ClusterSet::guess_and_grow(&[100, 102, 300], TOLERANCE).unwrap();
        assert_eq!(set.lookup(101).unwrap().min(), 100);
        assert_eq!(set.lookup(300).unwrap().count(), 1);
        assert!(set.lookup(200).is_none());
        assert!(set.lookup(0).is_none());
    }

    #[test]
    fn test_fold_leading_runt() {
        // 55 is a singleton runt equal to the first pulse duration
        let durations = [55, 100, 98, 103, 200, 202];
        let set = ClusterSet::guess_and_grow(&durations, TOLERANCE).unwrap();
        assert_eq!(set.len(), 3);

        let folded = set.fold_leading_runt(55);
        assert_eq!(folded.len(), 2);
        let merged = folded.get(0).unwrap();
        assert_eq!((merged.min(), merged.max()), (55, 103));
        assert_eq!(merged.count(), 4);
        // the folded set still partitions the source
        assert_partition(&folded, &durations);
    }

    #[test]
    fn test_fold_skips_non_runt() {
        // first cluster is not a singleton: nothing to fold
        let durations = [100, 98, 103, 200, 202];
        let set = ClusterSet::guess_and_grow(&durations, TOLERANCE).unwrap();
        let folded = set.clone().fold_leading_runt(98);
        assert_eq!(set, folded);

        // singleton exists but does not match the first duration
        let durations = [55, 100, 98, 103, 200, 202];
        let set = ClusterSet::guess_and_grow(&durations, TOLERANCE).unwrap();
        let folded = set.clone().fold_leading_runt(100);
        assert_eq!(set, folded);
    }

    #[test]
    fn test_fold_requires_neighbor() {
        // a lone cluster has no neighbor to merge with
        let set = ClusterSet::guess_and_grow(&[75], TOLERANCE).unwrap();
        let folded = set.clone().fold_leading_runt(75);
        assert_eq!(set, folded);
    }
}
