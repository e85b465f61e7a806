//! Sparse linear-scan store with a per-dimension window pre-filter.
//!
//! Only rows with every coordinate inside `[q[i] - window, q[i] + window]`
//! are ranked. A window that admits fewer than `k` rows yields sentinel
//! padded results; it is never widened.

use std::path::Path;

use crate::config::DescriptorSetConfig;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::linear::Rows;
use crate::persistence::vector_file::VECTOR_FILE;
use crate::search::{self, SearchResult};

#[derive(Debug, Clone)]
pub struct SparseScan {
    rows: Rows,
    window: f32,
}

impl SparseScan {
    pub fn window(&self) -> f32 {
        self.window
    }
}

impl VectorIndex for SparseScan {
    const FILE_NAME: &'static str = VECTOR_FILE;

    fn create(dimension: usize, config: &DescriptorSetConfig) -> Self {
        Self {
            rows: Rows::new(dimension),
            window: config.window,
        }
    }

    fn load(dir: &Path, config: &DescriptorSetConfig) -> Result<Self> {
        Ok(Self {
            rows: Rows::load(dir)?,
            window: config.window,
        })
    }

    fn write(&self, dir: &Path) -> Result<()> {
        self.rows.write(dir)
    }

    fn dimension(&self) -> usize {
        self.rows.dimension()
    }

    fn ntotal(&self) -> usize {
        self.rows.len()
    }

    fn add(&mut self, descriptors: &[f32]) -> Result<()> {
        self.rows.append(descriptors);
        Ok(())
    }

    fn search(&self, queries: &[f32], k: usize) -> SearchResult {
        search::windowed(
            queries,
            self.rows.data(),
            self.rows.dimension(),
            k,
            self.window,
        )
    }

    fn reconstruct(&self, position: usize) -> Option<&[f32]> {
        self.rows.row(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MISSING_ID;

    fn store_with_window(window: f32) -> SparseScan {
        let config = DescriptorSetConfig {
            window,
            ..Default::default()
        };
        let mut store = SparseScan::create(2, &config);
        let rows: Vec<f32> = (0..20).flat_map(|i| [i as f32 * 3.0, 0.0]).collect();
        store.add(&rows).unwrap();
        store
    }

    #[test]
    fn test_window_limits_candidates() {
        let store = store_with_window(4.0);
        // Rows at x = 27, 30, 33 fall inside [26, 34].
        let results = store.search(&[30.0, 0.0], 5);

        assert_eq!(results.found(0), 3);
        assert_eq!(results.ids(), &[10, 9, 11, MISSING_ID, MISSING_ID]);
    }

    #[test]
    fn test_empty_window() {
        let store = store_with_window(0.5);
        let results = store.search(&[1.5, 0.0], 2);
        assert_eq!(results.found(0), 0);
    }

    #[test]
    fn test_wide_window_matches_exhaustive() {
        let store = store_with_window(1000.0);
        let results = store.search(&[0.0, 0.0], 3);
        assert_eq!(results.ids(), &[0, 1, 2]);
    }
}
