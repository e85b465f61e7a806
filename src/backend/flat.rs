//! Exact flat index: O(n) k-NN search over every stored descriptor

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::neighbor_queue::{MaxHeap, Neighbor};
use crate::config::DescriptorSetConfig;
use crate::distance::squared_l2;
use crate::error::{DescriptorError, Result};
use crate::index::VectorIndex;
use crate::persistence::serialization;
use crate::search::{self, SearchResult};

/// Exact squared-L2 index over contiguous row-major storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatL2 {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatL2 {
    /// The `k` nearest stored positions to `query`, ascending.
    fn top_k(&self, query: &[f32], k: usize) -> Vec<(i64, f32)> {
        let mut heap = MaxHeap::with_limit(k);
        for (position, row) in self.data.chunks_exact(self.dimension).enumerate() {
            heap.push_bounded(Neighbor::new(position, squared_l2(query, row)));
        }
        heap.into_sorted_vec()
            .into_iter()
            .map(|n| (n.position as i64, n.distance))
            .collect()
    }
}

impl VectorIndex for FlatL2 {
    const FILE_NAME: &'static str = "index.bin";

    fn create(dimension: usize, _config: &DescriptorSetConfig) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    fn load(dir: &Path, _config: &DescriptorSetConfig) -> Result<Self> {
        let index: Self = serialization::read_bincode_file(&dir.join(Self::FILE_NAME))?;
        if index.dimension == 0 || index.data.len() % index.dimension != 0 {
            return Err(DescriptorError::open_failed(
                dir.join(Self::FILE_NAME),
                "descriptor data does not match the stored dimension",
            ));
        }
        Ok(index)
    }

    fn write(&self, dir: &Path) -> Result<()> {
        serialization::write_bincode_file(&dir.join(Self::FILE_NAME), self)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn ntotal(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn add(&mut self, descriptors: &[f32]) -> Result<()> {
        self.data.extend_from_slice(descriptors);
        Ok(())
    }

    fn search(&self, queries: &[f32], k: usize) -> SearchResult {
        search::scan_queries(queries, self.dimension, k, |query| self.top_k(query, k))
    }

    fn reconstruct(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }
}
