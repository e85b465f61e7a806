//! Lloyd's k-means for training the IVF coarse quantizer.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::distance::nearest_row;

/// Fit up to `k` centroids to `data` (row-major, `dim` wide).
///
/// Centroids start at distinct randomly chosen rows. `k` is clamped to the
/// number of rows. A centroid that loses all its members keeps its previous
/// value. Iteration stops early once no centroid moves.
pub fn train(data: &[f32], dim: usize, k: usize, iterations: usize, seed: u64) -> Vec<f32> {
    let n = if dim == 0 { 0 } else { data.len() / dim };
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids: Vec<f32> = rand::seq::index::sample(&mut rng, n, k)
        .iter()
        .flat_map(|row| data[row * dim..(row + 1) * dim].iter().copied())
        .collect();

    for _ in 0..iterations {
        let assignments: Vec<usize> = data
            .par_chunks_exact(dim)
            .map(|row| nearest_row(row, &centroids, dim).unwrap_or(0))
            .collect();

        let mut sums = vec![0f64; k * dim];
        let mut counts = vec![0usize; k];
        for (row, &cluster) in data.chunks_exact(dim).zip(&assignments) {
            counts[cluster] += 1;
            for (sum, value) in sums[cluster * dim..(cluster + 1) * dim].iter_mut().zip(row) {
                *sum += *value as f64;
            }
        }

        let mut moved = false;
        for cluster in (0..k).filter(|&c| counts[c] > 0) {
            let count = counts[cluster] as f64;
            let sum = &sums[cluster * dim..(cluster + 1) * dim];
            for (centroid, total) in centroids[cluster * dim..(cluster + 1) * dim]
                .iter_mut()
                .zip(sum)
            {
                let mean = (total / count) as f32;
                if mean != *centroid {
                    moved = true;
                    *centroid = mean;
                }
            }
        }
        if !moved {
            break;
        }
    }

    centroids
}
