//! Recall tests: verify the IVF engine finds the true nearest neighbors.

use std::collections::HashSet;

use descset::{DescriptorSet, DescriptorSetConfig, EngineKind, FlushPolicy, MISSING_ID};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

const CLUSTERS: usize = 8;

/// `n` descriptors spread over well separated clusters.
fn clustered_vectors(rng: &mut StdRng, n: usize, dim: usize) -> Vec<f32> {
    (0..n)
        .flat_map(|i| {
            let center = (i % CLUSTERS) as f32 * 100.0;
            (0..dim)
                .map(|_| center + rng.gen_range(-1.0..1.0))
                .collect::<Vec<f32>>()
        })
        .collect()
}

fn build(
    dir: &TempDir,
    name: &str,
    kind: EngineKind,
    dim: usize,
    data: &[f32],
    nprobe: usize,
) -> DescriptorSet {
    let config = DescriptorSetConfig {
        flush_policy: FlushPolicy::Manual,
        nlist: CLUSTERS,
        nprobe,
        ..Default::default()
    };
    let set = DescriptorSet::create(dir.path().join(name), dim, kind, config).unwrap();
    set.add(data, None).unwrap();
    set
}

fn recall_at_k(truth: &[i64], found: &[i64]) -> f64 {
    let truth: HashSet<i64> = truth.iter().copied().filter(|&id| id != MISSING_ID).collect();
    let hits = found.iter().filter(|id| truth.contains(id)).count();
    hits as f64 / truth.len() as f64
}

fn test_recall(n: usize, dim: usize, k: usize, num_queries: usize, nprobe: usize, min_recall: f64) {
    let mut rng = StdRng::seed_from_u64(42);
    let data = clustered_vectors(&mut rng, n, dim);
    let queries = clustered_vectors(&mut rng, num_queries, dim);

    let dir = TempDir::new().unwrap();
    let flat = build(&dir, "flat", EngineKind::ExactFlat, dim, &data, nprobe);
    let ivf = build(&dir, "ivf", EngineKind::PartitionedIvf, dim, &data, nprobe);

    let truth = flat.search(&queries, k).unwrap();
    let approx = ivf.search(&queries, k).unwrap();

    let total: f64 = (0..num_queries)
        .map(|q| {
            let range = q * k..(q + 1) * k;
            recall_at_k(&truth.ids()[range.clone()], &approx.ids()[range])
        })
        .sum();
    let avg_recall = total / num_queries as f64;
    assert!(
        avg_recall >= min_recall,
        "Recall {:.3} is below threshold {:.3} for n={}, dim={}, k={}, nprobe={}",
        avg_recall,
        min_recall,
        n,
        dim,
        k,
        nprobe
    );
}

#[test]
fn test_probing_every_list_is_exact() {
    test_recall(1000, 16, 10, 30, CLUSTERS, 1.0);
}

#[test]
fn test_recall_two_lists_searched() {
    test_recall(2000, 32, 10, 40, 2, 0.5);
}

#[test]
fn test_recall_5000_vectors() {
    test_recall(5000, 64, 10, 20, 3, 0.6);
}
