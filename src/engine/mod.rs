//! Engine selection and dispatch.
//!
//! An [`Engine`] is a closed set of backends, each wrapped in an
//! [`EngineCore`] that owns the lock, the id table, the label store and the
//! insert buffer. Dispatch is a plain `match`.

mod state;

pub use self::state::EngineCore;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::{FlatL2, IvfFlatL2};
use crate::config::DescriptorSetConfig;
use crate::error::{DescriptorError, Result};
use crate::linear::{DenseScan, SparseScan};
use crate::search::SearchResult;

/// Which backend a descriptor set is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Exact squared L2 over a flat store.
    ExactFlat,
    /// k-means partitioned inverted lists; approximate.
    PartitionedIvf,
    /// In-core exact linear scan.
    LinearDense,
    /// In-core linear scan restricted to a per-dimension window.
    LinearSparse,
}

impl EngineKind {
    pub const ALL: [EngineKind; 4] = [
        EngineKind::ExactFlat,
        EngineKind::PartitionedIvf,
        EngineKind::LinearDense,
        EngineKind::LinearSparse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::ExactFlat => "exact_flat",
            EngineKind::PartitionedIvf => "partitioned_ivf",
            EngineKind::LinearDense => "linear_dense",
            EngineKind::LinearSparse => "linear_sparse",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" | "exact_flat" | "flat_l2" => Ok(EngineKind::ExactFlat),
            "ivf" | "partitioned_ivf" | "ivf_flat" | "ivf_flat_l2" => {
                Ok(EngineKind::PartitionedIvf)
            }
            "dense" | "linear_dense" => Ok(EngineKind::LinearDense),
            "sparse" | "linear_sparse" => Ok(EngineKind::LinearSparse),
            _ => Err(DescriptorError::UnsupportedIndex(s.to_string())),
        }
    }
}

/// A descriptor set engine of one of the supported kinds.
#[derive(Debug)]
pub enum Engine {
    ExactFlat(EngineCore<FlatL2>),
    PartitionedIvf(EngineCore<IvfFlatL2>),
    LinearDense(EngineCore<DenseScan>),
    LinearSparse(EngineCore<SparseScan>),
}

macro_rules! dispatch {
    ($engine:expr, $core:ident => $body:expr) => {
        match $engine {
            Engine::ExactFlat($core) => $body,
            Engine::PartitionedIvf($core) => $body,
            Engine::LinearDense($core) => $body,
            Engine::LinearSparse($core) => $body,
        }
    };
}

impl Engine {
    pub fn create(
        kind: EngineKind,
        path: PathBuf,
        dimension: usize,
        config: DescriptorSetConfig,
    ) -> Self {
        match kind {
            EngineKind::ExactFlat => {
                Engine::ExactFlat(EngineCore::create(kind, path, dimension, config))
            }
            EngineKind::PartitionedIvf => {
                Engine::PartitionedIvf(EngineCore::create(kind, path, dimension, config))
            }
            EngineKind::LinearDense => {
                Engine::LinearDense(EngineCore::create(kind, path, dimension, config))
            }
            EngineKind::LinearSparse => {
                Engine::LinearSparse(EngineCore::create(kind, path, dimension, config))
            }
        }
    }

    pub fn open(kind: EngineKind, path: PathBuf, config: DescriptorSetConfig) -> Result<Self> {
        Ok(match kind {
            EngineKind::ExactFlat => Engine::ExactFlat(EngineCore::open(kind, path, config)?),
            EngineKind::PartitionedIvf => {
                Engine::PartitionedIvf(EngineCore::open(kind, path, config)?)
            }
            EngineKind::LinearDense => Engine::LinearDense(EngineCore::open(kind, path, config)?),
            EngineKind::LinearSparse => {
                Engine::LinearSparse(EngineCore::open(kind, path, config)?)
            }
        })
    }

    pub fn kind(&self) -> EngineKind {
        dispatch!(self, core => core.kind())
    }

    pub fn dimension(&self) -> usize {
        dispatch!(self, core => core.dimension())
    }

    pub fn config(&self) -> &DescriptorSetConfig {
        dispatch!(self, core => core.config())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, core => core.len())
    }

    pub fn is_empty(&self) -> bool {
        dispatch!(self, core => core.is_empty())
    }

    pub fn location(&self) -> PathBuf {
        dispatch!(self, core => core.location())
    }

    pub fn add(&self, descriptors: &[f32], labels: Option<&[i64]>) -> Result<()> {
        dispatch!(self, core => core.add(descriptors, labels))
    }

    pub fn train(&self) {
        dispatch!(self, core => core.train())
    }

    pub fn is_trained(&self) -> bool {
        dispatch!(self, core => core.is_trained())
    }

    pub fn search(&self, queries: &[f32], k: usize) -> Result<SearchResult> {
        dispatch!(self, core => core.search(queries, k))
    }

    pub fn classify(&self, descriptors: &[f32]) -> Result<Vec<i64>> {
        dispatch!(self, core => core.classify(descriptors))
    }

    pub fn get_descriptors(&self, positions: &[i64]) -> Result<Vec<f32>> {
        dispatch!(self, core => core.get_descriptors(positions))
    }

    pub fn set_labels(&self, labels: BTreeMap<i64, String>) -> Result<()> {
        dispatch!(self, core => core.set_labels(labels))
    }

    pub fn get_labels_all(&self) -> BTreeMap<i64, String> {
        dispatch!(self, core => core.get_labels_all())
    }

    pub fn get_labels(&self, positions: &[i64]) -> Result<Vec<String>> {
        dispatch!(self, core => core.get_labels(positions))
    }

    pub fn label_id_to_string(&self, label_ids: &[i64]) -> Vec<String> {
        dispatch!(self, core => core.label_id_to_string(label_ids))
    }

    pub fn store(&self) -> Result<()> {
        dispatch!(self, core => core.store())
    }

    pub fn store_to(&self, path: PathBuf) -> Result<()> {
        dispatch!(self, core => core.store_to(path))
    }
}
