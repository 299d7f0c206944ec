use fpmatch_core::{Descriptor, Match};
use rayon::prelude::*;

/// Hamming distance between two binary descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}

/// Index and distance of the first minimum of `distance(candidate)`.
fn nearest<F>(candidates: &[Descriptor], distance: F) -> (usize, u32)
where
    F: Fn(&Descriptor) -> u32,
{
    let mut best = (0usize, u32::MAX);
    for (idx, candidate) in candidates.iter().enumerate() {
        let dist = distance(candidate);
        if dist < best.1 {
            best = (idx, dist);
        }
    }
    best
}

/// Brute-force nearest-neighbour matcher under Hamming distance.
#[derive(Debug, Clone, Copy)]
pub struct BruteForceHamming {
    cross_check: bool,
    max_distance: Option<u32>,
}

impl Default for BruteForceHamming {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BruteForceHamming {
    pub fn new(cross_check: bool) -> Self {
        Self {
            cross_check,
            max_distance: None,
        }
    }

    /// Discard matches farther apart than `max_distance` bits.
    pub fn with_max_distance(mut self, max_distance: u32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Match every query descriptor to its nearest train descriptor.
    ///
    /// Ties go to the lowest index. With cross-check a pair is kept only when
    /// the train descriptor's own nearest query is the same descriptor, so
    /// each index appears at most once. Matches come out in query order.
    pub fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        let forward: Vec<(usize, u32)> = query
            .par_iter()
            .map(|q| nearest(train, |t| hamming_distance(q, t)))
            .collect();

        let reverse: Option<Vec<usize>> = self.cross_check.then(|| {
            train
                .par_iter()
                .map(|t| nearest(query, |q| hamming_distance(q, t)).0)
                .collect()
        });

        forward
            .into_iter()
            .enumerate()
            .filter(|&(query_idx, (train_idx, _))| match &reverse {
                Some(reverse) => reverse[train_idx] == query_idx,
                None => true,
            })
            .filter(|&(_, (_, distance))| self.max_distance.map_or(true, |max| distance <= max))
            .map(|(query_idx, (train_idx, distance))| Match {
                query_idx,
                train_idx,
                distance,
            })
            .collect()
    }
}

/// Sort matches by ascending distance; equal distances keep their order.
pub fn sort_by_distance(matches: &mut [Match]) {
    matches.sort_by_key(|m| m.distance);
}
