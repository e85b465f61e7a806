//! Quorum-vote classification over k-NN results.

use std::collections::HashMap;

use crate::error::Result;
use crate::id_table::{IdTable, NO_LABEL};
use crate::search::{SearchResult, MISSING_ID};

/// Label reported for a query whose neighbor list holds no stored descriptor.
pub const UNCLASSIFIED: i64 = 0;

/// Majority label per query, in query order.
///
/// Neighbors are visited closest first and the running winner only changes on
/// a strictly higher count, so on a tie the label that reached the count first
/// (the one with closer neighbors) is kept. Unlabelled neighbors cast no vote.
pub fn vote(result: &SearchResult, ids: &IdTable) -> Result<Vec<i64>> {
    (0..result.n_queries())
        .map(|query| {
            let mut counts: HashMap<i64, usize> = HashMap::new();
            let mut winner = UNCLASSIFIED;
            let mut best = 0;

            for (position, _) in result.neighbors(query) {
                if position == MISSING_ID {
                    continue;
                }
                let label = ids.label_at(position)?;
                if label == NO_LABEL {
                    continue;
                }
                let count = counts.entry(label).or_insert(0);
                *count += 1;
                if *count > best {
                    best = *count;
                    winner = label;
                }
            }
            Ok(winner)
        })
        .collect()
}
