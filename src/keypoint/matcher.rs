//! Brute-force Hamming matching with cross-check.

use crate::keypoint::brief::Descriptor;
use crate::util::math::hamming;

/// One accepted descriptor correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Correspondence {
    /// Index into the query (key) descriptors.
    pub query: usize,
    /// Index into the train (candidate) descriptors.
    pub train: usize,
    /// Hamming distance between the two descriptors.
    pub distance: u32,
}

/// Mutual nearest-neighbor matcher.
///
/// A pair `(i, j)` is accepted when `j` is the nearest train descriptor of
/// query `i` and `i` is the nearest query descriptor of train `j`. Ties go to
/// the lowest index. With `max_distance` set, accepted pairs must also be at
/// most that many bits apart.
#[derive(Clone, Copy, Debug, Default)]
pub struct CrossCheckMatcher {
    pub max_distance: Option<u32>,
    pub parallel: bool,
}

impl CrossCheckMatcher {
    pub fn new(max_distance: Option<u32>) -> Self {
        Self {
            max_distance,
            parallel: false,
        }
    }

    /// Returns accepted correspondences ordered by query index.
    pub fn match_descriptors(
        &self,
        query: &[Descriptor],
        train: &[Descriptor],
    ) -> Vec<Correspondence> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        #[cfg(feature = "rayon")]
        if self.parallel {
            let forward = nearest_par(query, train);
            let backward = nearest_par(train, query);
            return self.cross_check(&forward, &backward);
        }

        let (forward, backward) = nearest_both(query, train);
        self.cross_check(&forward, &backward)
    }

    fn cross_check(
        &self,
        forward: &[(u32, usize)],
        backward: &[(u32, usize)],
    ) -> Vec<Correspondence> {
        forward
            .iter()
            .enumerate()
            .filter(|&(i, &(distance, j))| {
                backward[j].1 == i && self.max_distance.map_or(true, |max| distance <= max)
            })
            .map(|(i, &(distance, j))| Correspondence {
                query: i,
                train: j,
                distance,
            })
            .collect()
    }
}

/// One pass over the distance matrix, tracking row and column minima.
fn nearest_both(
    query: &[Descriptor],
    train: &[Descriptor],
) -> (Vec<(u32, usize)>, Vec<(u32, usize)>) {
    let mut forward = vec![(u32::MAX, 0usize); query.len()];
    let mut backward = vec![(u32::MAX, 0usize); train.len()];
    for (i, q) in query.iter().enumerate() {
        for (j, t) in train.iter().enumerate() {
            let d = hamming(q, t);
            if d < forward[i].0 {
                forward[i] = (d, j);
            }
            if d < backward[j].0 {
                backward[j] = (d, i);
            }
        }
    }
    (forward, backward)
}

#[cfg(feature = "rayon")]
fn nearest_par(from: &[Descriptor], to: &[Descriptor]) -> Vec<(u32, usize)> {
    use rayon::prelude::*;

    from.par_iter()
        .map(|a| {
            let mut best = (u32::MAX, 0usize);
            for (j, b) in to.iter().enumerate() {
                let d = hamming(a, b);
                if d < best.0 {
                    best = (d, j);
                }
            }
            best
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Correspondence, CrossCheckMatcher};
    use crate::keypoint::brief::Descriptor;

    fn desc(fill: u8, first: u8) -> Descriptor {
        let mut d = [fill; 32];
        d[0] = first;
        d
    }

    #[test]
    fn identical_sets_match_one_to_one() {
        let set = vec![desc(0x00, 0), desc(0xFF, 0xFF), desc(0x0F, 0x0F)];
        let matches = CrossCheckMatcher::new(None).match_descriptors(&set, &set);
        assert_eq!(matches.len(), 3);
        assert!(matches.iter().all(|m| m.query == m.train && m.distance == 0));
    }

    #[test]
    fn cross_check_drops_one_sided_matches() {
        // Both queries prefer train 0; only the closer one survives.
        let query = vec![desc(0x00, 0x00), desc(0x00, 0x01)];
        let train = vec![desc(0x00, 0x00), desc(0xFF, 0xFF)];
        let matches = CrossCheckMatcher::new(None).match_descriptors(&query, &train);
        assert_eq!(
            matches,
            vec![Correspondence {
                query: 0,
                train: 0,
                distance: 0
            }]
        );
    }

    #[test]
    fn max_distance_filters_far_pairs() {
        let query = vec![desc(0x00, 0x00)];
        let train = vec![desc(0x01, 0x00)];
        assert_eq!(
            CrossCheckMatcher::new(None)
                .match_descriptors(&query, &train)
                .len(),
            1
        );
        assert!(CrossCheckMatcher::new(Some(16))
            .match_descriptors(&query, &train)
            .is_empty());
    }

    #[test]
    fn empty_side_yields_nothing() {
        let set = vec![desc(0, 0)];
        assert!(CrossCheckMatcher::default()
            .match_descriptors(&[], &set)
            .is_empty());
        assert!(CrossCheckMatcher::default()
            .match_descriptors(&set, &[])
            .is_empty());
    }
}
