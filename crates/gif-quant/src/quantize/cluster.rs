//! Lloyd iteration over cluster accumulators.
//!
//! Each iteration is two passes: a parallel assignment pass that folds every
//! sample into per-cluster sums, then a centroid update that reads the fully
//! reduced sums. Sums and errors are integers, so the result does not depend
//! on how the parallel reduction was split.

use rayon::prelude::*;

use crate::palette::nearest;

/// Upper bound on assignment/update rounds per clustering call.
pub(crate) const MAX_PASSES: usize = 64;

/// Per-cluster running sums for one assignment pass.
#[derive(Debug, Clone)]
pub(crate) struct ClusterAccumulator {
    sums: Vec<[u64; 3]>,
    counts: Vec<u64>,
    error: u64,
}

impl ClusterAccumulator {
    fn new(clusters: usize) -> Self {
        Self {
            sums: vec![[0; 3]; clusters],
            counts: vec![0; clusters],
            error: 0,
        }
    }

    #[inline]
    fn add(&mut self, cluster: usize, color: [u8; 3], dist: u32) {
        let sum = &mut self.sums[cluster];
        sum[0] += color[0] as u64;
        sum[1] += color[1] as u64;
        sum[2] += color[2] as u64;
        self.counts[cluster] += 1;
        self.error += dist as u64;
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.sums.iter_mut().zip(&other.sums) {
            a[0] += b[0];
            a[1] += b[1];
            a[2] += b[2];
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        self.error += other.error;
        self
    }

    /// Total squared error of the pass.
    pub(crate) fn error(&self) -> u64 {
        self.error
    }
}

/// Assignment pass: nearest centroid for every sample.
pub(crate) fn assign(samples: &[[u8; 3]], centroids: &[[u8; 3]]) -> ClusterAccumulator {
    let k = centroids.len();
    samples
        .par_iter()
        .fold(
            || ClusterAccumulator::new(k),
            |mut acc, &s| {
                let (idx, dist) = nearest(centroids, s);
                acc.add(idx, s, dist);
                acc
            },
        )
        .reduce(|| ClusterAccumulator::new(k), ClusterAccumulator::merge)
}

/// Update pass: move each centroid to the rounded mean of its cluster.
///
/// Empty clusters jump to a pseudo-random sample derived from the pass error
/// and the cluster index. Returns how many clusters were re-seeded.
pub(crate) fn update(
    centroids: &mut [[u8; 3]],
    acc: &ClusterAccumulator,
    samples: &[[u8; 3]],
) -> usize {
    let mut reseeded = 0;
    for (i, centroid) in centroids.iter_mut().enumerate() {
        let n = acc.counts[i];
        if n == 0 {
            *centroid = samples[reseed_index(acc.error, i, samples.len())];
            reseeded += 1;
        } else {
            *centroid = acc.sums[i].map(|s| ((s + n / 2) / n) as u8);
        }
    }
    reseeded
}

/// splitmix64 over the pass error and cluster index.
fn reseed_index(error: u64, cluster: usize, len: usize) -> usize {
    let mut z = error
        .wrapping_add((cluster as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z % len as u64) as usize
}

/// Outcome of a clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ClusterStats {
    pub passes: usize,
    pub error: u64,
    pub reseeded: usize,
}

/// Iterate assignment and update until the error stops improving by more
/// than `rel_tol` of the previous error.
pub(crate) fn lloyd(samples: &[[u8; 3]], centroids: &mut [[u8; 3]], rel_tol: f32) -> ClusterStats {
    let mut prev_error: Option<u64> = None;
    let mut stats = ClusterStats {
        passes: 0,
        error: 0,
        reseeded: 0,
    };

    for pass in 0..MAX_PASSES {
        let acc = assign(samples, centroids);
        let error = acc.error();
        let reseeded = update(centroids, &acc, samples);
        stats = ClusterStats {
            passes: pass + 1,
            error,
            reseeded: stats.reseeded + reseeded,
        };
        tracing::trace!(pass, error, reseeded, "Clustering pass");

        if error == 0 {
            break;
        }
        if let Some(prev) = prev_error {
            let improvement = prev.saturating_sub(error) as f64;
            if improvement <= rel_tol as f64 * prev as f64 {
                break;
            }
        }
        prev_error = Some(error);
    }

    stats
}
