//! In-core linear-scan stores: exact distances computed by this crate.

pub mod dense;
pub mod sparse;

pub use dense::DenseScan;
pub use sparse::SparseScan;

use std::path::Path;

use crate::error::{DescriptorError, Result};
use crate::persistence::vector_file;

/// Contiguous row-major descriptor rows in insertion order.
#[derive(Debug, Clone)]
pub(crate) struct Rows {
    dimension: usize,
    data: Vec<f32>,
}

impl Rows {
    pub(crate) fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    pub(crate) fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(vector_file::VECTOR_FILE);
        let (dimension, data) = vector_file::read(&path)?;
        if dimension == 0 {
            return Err(DescriptorError::open_failed(path, "stored dimension is zero"));
        }
        Ok(Self { dimension, data })
    }

    pub(crate) fn write(&self, dir: &Path) -> Result<()> {
        vector_file::write(&dir.join(vector_file::VECTOR_FILE), self.dimension, &self.data)
    }

    pub(crate) fn dimension(&self) -> usize {
        self.dimension
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    pub(crate) fn data(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn append(&mut self, descriptors: &[f32]) {
        self.data.extend_from_slice(descriptors);
    }

    pub(crate) fn row(&self, position: usize) -> Option<&[f32]> {
        let start = position.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }
}
