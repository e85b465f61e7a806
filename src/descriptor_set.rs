//! The `DescriptorSet` façade: one on-disk set of labelled descriptors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DescriptorSetConfig;
use crate::engine::{Engine, EngineKind};
use crate::error::{DescriptorError, Result};
use crate::search::SearchResult;

/// A directory of fixed-dimension descriptors with label ids, searchable by
/// squared L2 distance and classifiable by quorum vote.
///
/// All methods take `&self`; a set can be shared across threads behind an
/// `Arc`. Reads run concurrently, writes are exclusive.
#[derive(Debug)]
pub struct DescriptorSet {
    engine: Engine,
}

impl DescriptorSet {
    /// Start a new, empty set at `path`.
    ///
    /// Nothing is written until the first persist (the first `add` under the
    /// default flush policy, or `store`). Fails with `OpenFailed` if `path`
    /// already exists.
    pub fn create(
        path: impl AsRef<Path>,
        dimension: usize,
        kind: EngineKind,
        config: DescriptorSetConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        config.validate()?;
        if dimension == 0 {
            return Err(DescriptorError::InvalidDimension(dimension));
        }
        if path.exists() {
            return Err(DescriptorError::open_failed(path, "already exists"));
        }

        info!(path = %path.display(), engine = %kind, dimension, "creating descriptor set");
        Ok(Self {
            engine: Engine::create(kind, path, dimension, config),
        })
    }

    /// Open a set previously stored at `path` with the same engine kind.
    pub fn open(
        path: impl AsRef<Path>,
        kind: EngineKind,
        config: DescriptorSetConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        config.validate()?;
        if !path.is_dir() {
            return Err(DescriptorError::open_failed(path, "does not exist"));
        }
        Ok(Self {
            engine: Engine::open(kind, path, config)?,
        })
    }

    pub fn kind(&self) -> EngineKind {
        self.engine.kind()
    }

    pub fn dimension(&self) -> usize {
        self.engine.dimension()
    }

    pub fn config(&self) -> &DescriptorSetConfig {
        self.engine.config()
    }

    /// Number of descriptors held, including any not yet flushed.
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_empty()
    }

    /// Directory the set persists to.
    pub fn location(&self) -> PathBuf {
        self.engine.location()
    }

    /// Add `descriptors.len() / dimension` row-major descriptors.
    ///
    /// With `labels`, one label id per descriptor; without, every new
    /// position records [`NO_LABEL`](crate::id_table::NO_LABEL), which is
    /// rejected as a caller-supplied id (`InvalidLabel`).
    pub fn add(&self, descriptors: &[f32], labels: Option<&[i64]>) -> Result<()> {
        self.engine.add(descriptors, labels)
    }

    /// No-op: backends that need training train on their first committed batch.
    pub fn train(&self) {
        self.engine.train()
    }

    pub fn is_trained(&self) -> bool {
        self.engine.is_trained()
    }

    /// The `k` nearest stored descriptors of every query.
    pub fn search(&self, queries: &[f32], k: usize) -> Result<SearchResult> {
        self.engine.search(queries, k)
    }

    /// [`search`](Self::search) into caller-owned slices of `n_queries * k`.
    pub fn search_into(
        &self,
        queries: &[f32],
        k: usize,
        ids: &mut [i64],
        distances: &mut [f32],
    ) -> Result<()> {
        let expected = (queries.len() / self.dimension()) * k;
        if ids.len() != expected {
            return Err(DescriptorError::SizeMismatch {
                what: "ids",
                expected,
                actual: ids.len(),
            });
        }
        if distances.len() != expected {
            return Err(DescriptorError::SizeMismatch {
                what: "distances",
                expected,
                actual: distances.len(),
            });
        }

        let result = self.engine.search(queries, k)?;
        ids.copy_from_slice(result.ids());
        distances.copy_from_slice(result.distances());
        Ok(())
    }

    /// Label id per descriptor by majority vote of its `quorum` nearest neighbors.
    pub fn classify(&self, descriptors: &[f32]) -> Result<Vec<i64>> {
        self.engine.classify(descriptors)
    }

    /// Stored descriptors at `positions`, concatenated row-major.
    pub fn get_descriptors(&self, positions: &[i64]) -> Result<Vec<f32>> {
        self.engine.get_descriptors(positions)
    }

    /// Replace the label id -> name map.
    ///
    /// Names must not contain line breaks or leading/trailing whitespace
    /// (`InvalidLabel`); on error the previous map is kept.
    pub fn set_labels(&self, labels: BTreeMap<i64, String>) -> Result<()> {
        self.engine.set_labels(labels)
    }

    /// Replace the label map from parallel id and name lists.
    pub fn set_labels_from<S: AsRef<str>>(&self, ids: &[i64], names: &[S]) -> Result<()> {
        if ids.len() != names.len() {
            return Err(DescriptorError::SizeMismatch {
                what: "label names",
                expected: ids.len(),
                actual: names.len(),
            });
        }
        let labels = ids
            .iter()
            .zip(names)
            .map(|(&id, name)| (id, name.as_ref().to_string()))
            .collect();
        self.engine.set_labels(labels)
    }

    pub fn get_labels_all(&self) -> BTreeMap<i64, String> {
        self.engine.get_labels_all()
    }

    /// Label name of the descriptor at each position; empty for unnamed ids.
    pub fn get_labels(&self, positions: &[i64]) -> Result<Vec<String>> {
        self.engine.get_labels(positions)
    }

    pub fn label_id_to_string(&self, label_ids: &[i64]) -> Vec<String> {
        self.engine.label_id_to_string(label_ids)
    }

    /// Flush and persist to [`location`](Self::location).
    pub fn store(&self) -> Result<()> {
        self.engine.store()
    }

    /// Flush and persist to `path`. On success `path` becomes the location.
    pub fn store_to(&self, path: impl AsRef<Path>) -> Result<()> {
        self.engine.store_to(path.as_ref().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_rejects_existing_path() {
        let dir = TempDir::new().unwrap();
        let result = DescriptorSet::create(
            dir.path(),
            4,
            EngineKind::ExactFlat,
            DescriptorSetConfig::default(),
        );
        assert!(matches!(result, Err(DescriptorError::OpenFailed { .. })));
    }

    #[test]
    fn test_create_rejects_zero_dimension() {
        let dir = TempDir::new().unwrap();
        let result = DescriptorSet::create(
            dir.path().join("set"),
            0,
            EngineKind::ExactFlat,
            DescriptorSetConfig::default(),
        );
        assert!(matches!(result, Err(DescriptorError::InvalidDimension(0))));
    }

    #[test]
    fn test_open_missing_path() {
        let dir = TempDir::new().unwrap();
        let result = DescriptorSet::open(
            dir.path().join("missing"),
            EngineKind::LinearDense,
            DescriptorSetConfig::default(),
        );
        assert!(matches!(result, Err(DescriptorError::OpenFailed { .. })));
    }

    #[test]
    fn test_search_into_checks_lengths() {
        let dir = TempDir::new().unwrap();
        let set = DescriptorSet::create(
            dir.path().join("set"),
            2,
            EngineKind::LinearDense,
            DescriptorSetConfig::default(),
        )
        .unwrap();
        set.add(&[0.0, 0.0, 1.0, 1.0], None).unwrap();

        let mut ids = [0i64; 3];
        let mut distances = [0f32; 4];
        assert!(matches!(
            set.search_into(&[0.0, 0.0, 1.0, 1.0], 2, &mut ids, &mut distances),
            Err(DescriptorError::SizeMismatch { what: "ids", expected: 4, actual: 3 })
        ));

        let mut ids = [0i64; 4];
        set.search_into(&[0.0, 0.0, 1.0, 1.0], 2, &mut ids, &mut distances)
            .unwrap();
        assert_eq!(ids, [0, 1, 1, 0]);
        assert_eq!(distances, [0.0, 2.0, 0.0, 2.0]);
    }

    #[test]
    fn test_set_labels_from_length_mismatch() {
        let dir = TempDir::new().unwrap();
        let set = DescriptorSet::create(
            dir.path().join("set"),
            2,
            EngineKind::LinearDense,
            DescriptorSetConfig::default(),
        )
        .unwrap();

        assert!(matches!(
            set.set_labels_from(&[1, 2], &["dog"]),
            Err(DescriptorError::SizeMismatch { expected: 2, actual: 1, .. })
        ));
        set.set_labels_from(&[1, 2], &["dog", "cat"]).unwrap();
        assert_eq!(set.label_id_to_string(&[2, 1, 3]), vec!["cat", "dog", ""]);

        assert!(matches!(
            set.set_labels_from(&[3], &["bad\nname"]),
            Err(DescriptorError::InvalidLabel { id: 3, .. })
        ));
        assert_eq!(set.label_id_to_string(&[1]), vec!["dog"]);
    }
}
