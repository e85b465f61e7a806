//! Index trait for pluggable descriptor storage and search backends

use std::path::Path;

use crate::config::DescriptorSetConfig;
use crate::error::Result;
use crate::search::SearchResult;

/// Storage and exact-or-approximate k-NN search over row-major descriptors.
///
/// Positions are assigned in insertion order starting at 0 and never change.
/// Implementations are driven by an engine that owns locking, labels and
/// persistence scheduling; they only hold descriptor data.
pub trait VectorIndex: Send + Sync + Sized {
    /// File this backend writes inside a descriptor set directory.
    const FILE_NAME: &'static str;

    /// Create an empty backend for `dimension`-wide descriptors.
    fn create(dimension: usize, config: &DescriptorSetConfig) -> Self;

    /// Load a backend previously written with [`VectorIndex::write`].
    fn load(dir: &Path, config: &DescriptorSetConfig) -> Result<Self>;

    /// Persist the backend into `dir`, replacing any previous file.
    fn write(&self, dir: &Path) -> Result<()>;

    fn dimension(&self) -> usize;

    /// Number of stored descriptors.
    fn ntotal(&self) -> usize;

    fn is_trained(&self) -> bool {
        true
    }

    /// Fit the backend to `descriptors`. Backends without a training step ignore it.
    fn train(&mut self, _descriptors: &[f32]) -> Result<()> {
        Ok(())
    }

    /// Append row-major descriptors at positions `ntotal()..`.
    fn add(&mut self, descriptors: &[f32]) -> Result<()>;

    /// Up to `k` nearest stored positions for every query, sentinel padded.
    fn search(&self, queries: &[f32], k: usize) -> SearchResult;

    /// The stored descriptor at `position`.
    fn reconstruct(&self, position: usize) -> Option<&[f32]>;
}
