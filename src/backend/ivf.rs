//! IVF-Flat index: k-means partitioned inverted lists with flat storage.
//!
//! Descriptors are assigned to their nearest centroid at insertion time. A
//! query scans only the `nprobe` lists whose centroids are closest to it, so
//! results are approximate whenever `nprobe < nlist`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::kmeans;
use crate::backend::neighbor_queue::{MaxHeap, Neighbor};
use crate::config::DescriptorSetConfig;
use crate::distance::{nearest_row, squared_l2};
use crate::error::{DescriptorError, Result};
use crate::index::VectorIndex;
use crate::persistence::serialization;
use crate::search::{self, SearchResult};

/// One inverted list: the positions and rows assigned to a centroid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InvertedList {
    positions: Vec<usize>,
    data: Vec<f32>,
}

/// Inverted-file index over squared L2 distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IvfFlatL2 {
    dimension: usize,
    nlist: usize,
    /// Row-major centroids; empty until trained.
    centroids: Vec<f32>,
    lists: Vec<InvertedList>,
    /// Position -> (list, slot within list).
    locations: Vec<(u32, u32)>,
    #[serde(skip)]
    nprobe: usize,
    #[serde(skip)]
    iterations: usize,
    #[serde(skip)]
    seed: u64,
}

impl IvfFlatL2 {
    /// Number of trained centroids. May be below the configured `nlist`
    /// when the training batch was smaller.
    pub fn num_lists(&self) -> usize {
        self.lists.len()
    }

    fn apply_config(&mut self, config: &DescriptorSetConfig) {
        self.nprobe = config.nprobe;
        self.iterations = config.kmeans_iterations;
        self.seed = config.seed;
    }

    fn top_k(&self, query: &[f32], k: usize) -> Vec<(i64, f32)> {
        let mut nearest_lists = MaxHeap::with_limit(self.nprobe);
        for (list, centroid) in self.centroids.chunks_exact(self.dimension).enumerate() {
            nearest_lists.push_bounded(Neighbor::new(list, squared_l2(query, centroid)));
        }

        let mut heap = MaxHeap::with_limit(k);
        for centroid in nearest_lists.into_sorted_vec() {
            let list = &self.lists[centroid.position];
            for (&position, row) in list
                .positions
                .iter()
                .zip(list.data.chunks_exact(self.dimension))
            {
                heap.push_bounded(Neighbor::new(position, squared_l2(query, row)));
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|n| (n.position as i64, n.distance))
            .collect()
    }
}

impl VectorIndex for IvfFlatL2 {
    const FILE_NAME: &'static str = "index.bin";

    fn create(dimension: usize, config: &DescriptorSetConfig) -> Self {
        let mut index = Self {
            dimension,
            nlist: config.nlist,
            centroids: Vec::new(),
            lists: Vec::new(),
            locations: Vec::new(),
            nprobe: 0,
            iterations: 0,
            seed: 0,
        };
        index.apply_config(config);
        index
    }

    fn load(dir: &Path, config: &DescriptorSetConfig) -> Result<Self> {
        let path = dir.join(Self::FILE_NAME);
        let mut index: Self = serialization::read_bincode_file(&path)?;
        if index.dimension == 0 || index.centroids.len() != index.lists.len() * index.dimension {
            return Err(DescriptorError::open_failed(
                path,
                "centroids do not match the inverted lists",
            ));
        }
        index.apply_config(config);
        Ok(index)
    }

    fn write(&self, dir: &Path) -> Result<()> {
        serialization::write_bincode_file(&dir.join(Self::FILE_NAME), self)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn ntotal(&self) -> usize {
        self.locations.len()
    }

    fn is_trained(&self) -> bool {
        !self.centroids.is_empty()
    }

    fn train(&mut self, descriptors: &[f32]) -> Result<()> {
        let centroids = kmeans::train(
            descriptors,
            self.dimension,
            self.nlist,
            self.iterations,
            self.seed,
        );
        if centroids.is_empty() {
            return Err(DescriptorError::EmptyBatch);
        }
        self.lists = vec![InvertedList::default(); centroids.len() / self.dimension];
        self.centroids = centroids;
        Ok(())
    }

    fn add(&mut self, descriptors: &[f32]) -> Result<()> {
        if !self.is_trained() {
            return Err(DescriptorError::NotTrained);
        }

        for row in descriptors.chunks_exact(self.dimension) {
            let list_id = nearest_row(row, &self.centroids, self.dimension).unwrap_or(0);
            let position = self.locations.len();
            let list = &mut self.lists[list_id];
            self.locations
                .push((list_id as u32, list.positions.len() as u32));
            list.positions.push(position);
            list.data.extend_from_slice(row);
        }
        Ok(())
    }

    fn search(&self, queries: &[f32], k: usize) -> SearchResult {
        search::scan_queries(queries, self.dimension, k, |query| self.top_k(query, k))
    }

    fn reconstruct(&self, position: usize) -> Option<&[f32]> {
        let &(list, slot) = self.locations.get(position)?;
        let start = slot as usize * self.dimension;
        self.lists
            .get(list as usize)?
            .data
            .get(start..start + self.dimension)
    }
}
