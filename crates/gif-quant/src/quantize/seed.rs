//! Farthest-point palette seeding.
//!
//! Deterministic k-means++-style initialization: the first centroid is the
//! first sample, each further centroid is the sample farthest from every
//! centroid chosen so far. Two passes per centroid, each a full barrier:
//! a distance scan updating every sample's nearest-centroid distance, then a
//! selection reduce picking the maximum.

use rayon::prelude::*;

use crate::color::distance_sq;

/// Pick `k` seeds from `samples`.
///
/// Ties go to the lowest sample index. Once every sample coincides with a
/// seed, the remaining seeds repeat the last pick.
pub(crate) fn farthest_point_seeds(samples: &[[u8; 3]], k: usize) -> Vec<[u8; 3]> {
    debug_assert!(!samples.is_empty());
    let mut seeds = Vec::with_capacity(k);
    let first = samples[0];
    seeds.push(first);

    let mut min_dist: Vec<u32> = samples.par_iter().map(|&s| distance_sq(s, first)).collect();

    while seeds.len() < k {
        let (idx, dist) = min_dist
            .par_iter()
            .enumerate()
            .map(|(i, &d)| (i, d))
            .reduce(|| (usize::MAX, 0), farther);

        if dist == 0 {
            let last = *seeds.last().unwrap_or(&first);
            seeds.resize(k, last);
            break;
        }

        let next = samples[idx];
        seeds.push(next);

        min_dist
            .par_iter_mut()
            .zip(samples.par_iter())
            .for_each(|(d, &s)| *d = (*d).min(distance_sq(s, next)));
    }

    seeds
}

/// Reduce step: larger distance wins, then lower index.
#[inline]
fn farther(a: (usize, u32), b: (usize, u32)) -> (usize, u32) {
    if b.1 > a.1 || (b.1 == a.1 && b.0 < a.0) {
        b
    } else {
        a
    }
}
