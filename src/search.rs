//! k-NN result layout and the linear-scan select routine.
//!
//! Every engine reports results as `n_queries * k` slots. A slot that has no
//! neighbor holds [`MISSING_ID`] and [`MISSING_DISTANCE`].

use std::cmp::Ordering;

use rayon::prelude::*;

use crate::distance::{squared_l2, within_window};

/// Id reported for a slot with no neighbor.
pub const MISSING_ID: i64 = -1;

/// Distance reported for a slot with no neighbor.
pub const MISSING_DISTANCE: f32 = f32::MAX;

/// Results of a batched k-NN query.
///
/// Slot `q * k + j` holds the `j`-th nearest neighbor of query `q`,
/// ascending by squared L2 distance.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    n_queries: usize,
    k: usize,
    ids: Vec<i64>,
    distances: Vec<f32>,
}

impl SearchResult {
    /// A result with every slot set to the missing sentinel.
    pub fn missing(n_queries: usize, k: usize) -> Self {
        Self {
            n_queries,
            k,
            ids: vec![MISSING_ID; n_queries * k],
            distances: vec![MISSING_DISTANCE; n_queries * k],
        }
    }

    pub fn n_queries(&self) -> usize {
        self.n_queries
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Neighbor positions, `n_queries * k` long.
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Squared L2 distances, `n_queries * k` long.
    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    /// The `(position, distance)` slots of one query, sentinels included.
    pub fn neighbors(&self, query: usize) -> impl Iterator<Item = (i64, f32)> + '_ {
        let range = query * self.k..(query + 1) * self.k;
        self.ids[range.clone()]
            .iter()
            .copied()
            .zip(self.distances[range].iter().copied())
    }

    /// Number of real (non-sentinel) neighbors found for one query.
    pub fn found(&self, query: usize) -> usize {
        self.neighbors(query)
            .filter(|(id, _)| *id != MISSING_ID)
            .count()
    }

    pub fn into_parts(self) -> (Vec<i64>, Vec<f32>) {
        (self.ids, self.distances)
    }

    pub(crate) fn slots_mut(&mut self) -> (&mut [i64], &mut [f32]) {
        (&mut self.ids, &mut self.distances)
    }
}

/// Ascending by distance, ties broken by the lower position.
#[inline]
pub(crate) fn by_distance_then_position(a: &(i64, f32), b: &(i64, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

/// Write the `k` nearest of `candidates` into the output slots.
///
/// Uses an introselect partial sort so only the winning `k` are fully
/// ordered. Slots beyond the candidate count receive the missing sentinel.
pub fn select_k(candidates: &mut Vec<(i64, f32)>, ids: &mut [i64], distances: &mut [f32]) {
    let k = ids.len();
    debug_assert_eq!(k, distances.len());
    if k == 0 {
        return;
    }

    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, by_distance_then_position);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(by_distance_then_position);

    for slot in 0..k {
        match candidates.get(slot) {
            Some(&(id, distance)) => {
                ids[slot] = id;
                distances[slot] = distance;
            }
            None => {
                ids[slot] = MISSING_ID;
                distances[slot] = MISSING_DISTANCE;
            }
        }
    }
}

/// Run `candidates_for` on every query in parallel and select the `k`
/// nearest of each candidate set.
pub fn scan_queries<F>(queries: &[f32], dim: usize, k: usize, candidates_for: F) -> SearchResult
where
    F: Fn(&[f32]) -> Vec<(i64, f32)> + Sync,
{
    let n_queries = if dim == 0 { 0 } else { queries.len() / dim };
    let mut result = SearchResult::missing(n_queries, k);
    if k == 0 || n_queries == 0 {
        return result;
    }

    let (ids, distances) = result.slots_mut();
    ids.par_chunks_mut(k)
        .zip(distances.par_chunks_mut(k))
        .zip(queries.par_chunks_exact(dim))
        .for_each(|((ids, distances), query)| {
            let mut candidates = candidates_for(query);
            select_k(&mut candidates, ids, distances);
        });

    result
}

/// Exact search over every row of `rows`.
pub fn exhaustive(queries: &[f32], rows: &[f32], dim: usize, k: usize) -> SearchResult {
    scan_queries(queries, dim, k, |query| {
        rows.chunks_exact(dim)
            .enumerate()
            .map(|(position, row)| (position as i64, squared_l2(query, row)))
            .collect()
    })
}

/// Exact search over the rows inside the per-dimension window around each query.
pub fn windowed(queries: &[f32], rows: &[f32], dim: usize, k: usize, window: f32) -> SearchResult {
    scan_queries(queries, dim, k, |query| {
        rows.chunks_exact(dim)
            .enumerate()
            .filter(|(_, row)| within_window(query, row, window))
            .map(|(position, row)| (position as i64, squared_l2(query, row)))
            .collect()
    })
}
