//! Dense linear-scan store: every query is compared against every row.

use std::path::Path;

use crate::config::DescriptorSetConfig;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::linear::Rows;
use crate::persistence::vector_file::VECTOR_FILE;
use crate::search::{self, SearchResult};

#[derive(Debug, Clone)]
pub struct DenseScan {
    rows: Rows,
}

impl VectorIndex for DenseScan {
    const FILE_NAME: &'static str = VECTOR_FILE;

    fn create(dimension: usize, _config: &DescriptorSetConfig) -> Self {
        Self {
            rows: Rows::new(dimension),
        }
    }

    fn load(dir: &Path, _config: &DescriptorSetConfig) -> Result<Self> {
        Ok(Self {
            rows: Rows::load(dir)?,
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
        search::exhaustive(queries, self.rows.data(), self.rows.dimension(), k)
    }

    fn reconstruct(&self, position: usize) -> Option<&[f32]> {
        self.rows.row(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MISSING_ID;
    use tempfile::TempDir;

    #[test]
    fn test_dense_scan_search() {
        let mut store = DenseScan::create(2, &DescriptorSetConfig::default());
        store.add(&[0.0, 0.0, 3.0, 4.0, 1.0, 1.0]).unwrap();

        let results = store.search(&[0.0, 0.0], 4);
        assert_eq!(results.ids(), &[0, 2, 1, MISSING_ID]);
        assert_eq!(results.distances()[..3], [0.0, 2.0, 25.0]);
    }

    #[test]
    fn test_dense_scan_write_and_load() {
        let dir = TempDir::new().unwrap();
        let mut store = DenseScan::create(3, &DescriptorSetConfig::default());
        store.add(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        store.write(dir.path()).unwrap();

        let loaded = DenseScan::load(dir.path(), &DescriptorSetConfig::default()).unwrap();
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.ntotal(), 2);
        assert_eq!(loaded.reconstruct(1), Some(&[4.0, 5.0, 6.0][..]));
    }
}
