//! Brute-force Hamming matcher with cross-check filtering.
//!
//! A pair (i, j) is kept only when descriptor j is the nearest stored
//! descriptor to live descriptor i *and* i is the nearest live descriptor to
//! j. Ties resolve to the lowest index on both sides.

use super::Descriptor;

/// A mutual nearest-neighbour pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureMatch {
    /// Index into the query (live) descriptors
    pub query: usize,
    /// Index into the train (stored) descriptors
    pub train: usize,
    /// Hamming distance between the two
    pub distance: u32,
}

/// Cross-checked brute-force matcher.
#[derive(Clone, Debug)]
pub struct CrossCheckMatcher {
    /// Matches at or above this distance are not counted as good
    max_distance: u32,
}

impl CrossCheckMatcher {
    pub fn new(max_distance: u32) -> Self {
        Self { max_distance }
    }

    /// All mutual nearest-neighbour pairs, regardless of distance.
    pub fn match_descriptors(
        &self,
        query: &[Descriptor],
        train: &[Descriptor],
    ) -> Vec<FeatureMatch> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        // Best query index for every train descriptor
        let mut best_for_train = vec![(u32::MAX, usize::MAX); train.len()];
        // Best train index for every query descriptor
        let mut best_for_query = vec![(u32::MAX, usize::MAX); query.len()];

        for (qi, q) in query.iter().enumerate() {
            for (ti, t) in train.iter().enumerate() {
                let d = q.hamming_distance(t);
                if d < best_for_query[qi].0 {
                    best_for_query[qi] = (d, ti);
                }
                if d < best_for_train[ti].0 {
                    best_for_train[ti] = (d, qi);
                }
            }
        }

        best_for_query
            .iter()
            .enumerate()
            .filter_map(|(qi, &(distance, ti))| {
                (best_for_train[ti].1 == qi).then_some(FeatureMatch {
                    query: qi,
                    train: ti,
                    distance,
                })
            })
            .collect()
    }

    /// Number of cross-checked matches closer than the acceptance distance.
    pub fn match_score(&self, query: &[Descriptor], train: &[Descriptor]) -> usize {
        self.match_descriptors(query, train)
            .iter()
            .filter(|m| m.distance < self.max_distance)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(bits: u64) -> Descriptor {
        Descriptor([bits, 0, 0, 0])
    }

    /// Descriptor with the low `n` bits set.
    fn ones(n: u32) -> Descriptor {
        let mut words = [0u64; 4];
        for bit in 0..n as usize {
            words[bit / 64] |= 1 << (bit % 64);
        }
        Descriptor(words)
    }

    #[test]
    fn test_identical_sets_match_fully() {
        let set = vec![desc(0b1), desc(0b1100), desc(0xF0F0)];
        let matcher = CrossCheckMatcher::new(50);
        let matches = matcher.match_descriptors(&set, &set);
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| m.query == m.train && m.distance == 0));
        assert_eq!(matcher.match_score(&set, &set), 3);
    }

    #[test]
    fn test_cross_check_rejects_one_sided_match() {
        // Both query descriptors are nearest to train[0], which prefers query[0].
        let query = vec![ones(0), ones(2)];
        let train = vec![ones(1), ones(200)];
        let matcher = CrossCheckMatcher::new(50);
        let matches = matcher.match_descriptors(&query, &train);
        assert_eq!(
            matches,
            vec![FeatureMatch {
                query: 0,
                train: 0,
                distance: 1
            }]
        );
    }

    #[test]
    fn test_distance_threshold_is_strict() {
        let query = vec![ones(0)];
        let matcher = CrossCheckMatcher::new(50);
        assert_eq!(matcher.match_score(&query, &[ones(49)]), 1);
        assert_eq!(matcher.match_score(&query, &[ones(50)]), 0);
    }

    #[test]
    fn test_empty_inputs() {
        let matcher = CrossCheckMatcher::new(50);
        assert!(matcher.match_descriptors(&[], &[desc(1)]).is_empty());
        assert_eq!(matcher.match_score(&[desc(1)], &[]), 0);
    }
}
