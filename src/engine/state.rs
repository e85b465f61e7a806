//! Lock-guarded engine state shared by every backend.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument, warn};

use crate::buffer::InsertBuffer;
use crate::classify;
use crate::config::{DescriptorSetConfig, FlushPolicy};
use crate::engine::EngineKind;
use crate::error::{DescriptorError, Result};
use crate::id_table::{IdTable, IDS_FILE, NO_LABEL};
use crate::index::VectorIndex;
use crate::labels::{LabelStore, LABELS_FILE};
use crate::persistence::manifest::Manifest;
use crate::search::SearchResult;

/// Everything an engine mutates, guarded by one lock.
#[derive(Debug)]
struct EngineState<B> {
    backend: B,
    ids: IdTable,
    labels: LabelStore,
    buffer: InsertBuffer,
    location: PathBuf,
}

impl<B: VectorIndex> EngineState<B> {
    /// Append a validated batch to the backend and the id table.
    fn commit(&mut self, descriptors: &[f32], labels: Option<&[i64]>, n: usize) -> Result<()> {
        if !self.backend.is_trained() {
            debug!(n, "training backend on first committed batch");
            self.backend.train(descriptors)?;
        }
        self.backend.add(descriptors)?;
        self.ids.extend(labels, n);
        Ok(())
    }

    /// Commit whatever the insert buffer holds. Returns whether anything was committed.
    fn drain_buffer(&mut self) -> Result<bool> {
        match self.buffer.take() {
            Some(batch) => {
                debug!(pending = batch.len, "flushing insert buffer");
                self.commit(&batch.descriptors, batch.labels.as_deref(), batch.len)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn persist(&self, kind: EngineKind, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        self.backend.write(dir)?;
        let ids_crc32 = self.ids.write(dir)?;
        self.labels.write(dir)?;
        Manifest::new(kind, self.backend.dimension(), self.ids.len(), ids_crc32).write(dir)?;
        debug!(path = %dir.display(), count = self.ids.len(), "persisted descriptor set");
        Ok(())
    }
}

/// One backend behind a `RwLock`, with the flush discipline applied around it.
#[derive(Debug)]
pub struct EngineCore<B> {
    kind: EngineKind,
    dimension: usize,
    config: DescriptorSetConfig,
    state: RwLock<EngineState<B>>,
}

impl<B: VectorIndex> EngineCore<B> {
    /// A new, empty engine. Nothing is written until the first persist.
    pub fn create(
        kind: EngineKind,
        path: PathBuf,
        dimension: usize,
        config: DescriptorSetConfig,
    ) -> Self {
        let backend = B::create(dimension, &config);
        Self {
            kind,
            dimension,
            state: RwLock::new(EngineState {
                backend,
                ids: IdTable::new(),
                labels: LabelStore::new(),
                buffer: InsertBuffer::new(),
                location: path,
            }),
            config,
        }
    }

    /// Load a stored engine from `path`.
    #[instrument(skip_all, fields(engine = %kind, path = %path.display()))]
    pub fn open(kind: EngineKind, path: PathBuf, config: DescriptorSetConfig) -> Result<Self> {
        let manifest = reading(&path, Manifest::read(&path))?;
        if let Some(manifest) = &manifest {
            if manifest.engine != kind {
                return Err(DescriptorError::open_failed(
                    &path,
                    format!(
                        "stored by the {} engine, not {}",
                        manifest.engine, kind
                    ),
                ));
            }
        }

        let backend_file = path.join(B::FILE_NAME);
        if !backend_file.is_file() {
            return Err(DescriptorError::open_failed(backend_file, "index file missing"));
        }
        let backend = reading(&backend_file, B::load(&path, &config))?;

        let ids_file = path.join(IDS_FILE);
        if !ids_file.is_file() {
            return Err(DescriptorError::open_failed(ids_file, "id table missing"));
        }
        let (ids, ids_crc32) = reading(&ids_file, IdTable::read(&path))?;
        if let Some(manifest) = &manifest {
            if manifest.ids_crc32 != ids_crc32 {
                return Err(DescriptorError::open_failed(
                    ids_file,
                    "checksum does not match the manifest",
                ));
            }
        }
        if ids.len() != backend.ntotal() {
            return Err(DescriptorError::open_failed(
                ids_file,
                format!(
                    "{} labels recorded for {} stored descriptors",
                    ids.len(),
                    backend.ntotal()
                ),
            ));
        }

        let labels = reading(&path.join(LABELS_FILE), LabelStore::read(&path))?;

        if !backend.is_trained() {
            warn!("opened an untrained index; it trains on the next committed batch");
        }
        info!(
            engine = %kind,
            dimension = backend.dimension(),
            count = ids.len(),
            labels = labels.len(),
            "opened descriptor set"
        );

        Ok(Self {
            kind,
            dimension: backend.dimension(),
            config,
            state: RwLock::new(EngineState {
                backend,
                ids,
                labels,
                buffer: InsertBuffer::new(),
                location: path,
            }),
        })
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn config(&self) -> &DescriptorSetConfig {
        &self.config
    }

    /// Descriptors held, committed or still buffered.
    pub fn len(&self) -> usize {
        let state = self.state.read();
        state.ids.len() + state.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn location(&self) -> PathBuf {
        self.state.read().location.clone()
    }

    pub fn add(&self, descriptors: &[f32], labels: Option<&[i64]>) -> Result<()> {
        let n = self.rows_in(descriptors)?;
        if n == 0 {
            return Err(DescriptorError::EmptyBatch);
        }
        if let Some(labels) = labels {
            if labels.len() != n {
                return Err(DescriptorError::SizeMismatch {
                    what: "labels",
                    expected: n,
                    actual: labels.len(),
                });
            }
            if labels.contains(&NO_LABEL) {
                return Err(DescriptorError::InvalidLabel {
                    id: NO_LABEL,
                    reason: "reserved for unlabelled descriptors",
                });
            }
        }

        let mut state = self.state.write();
        match self.config.flush_policy {
            FlushPolicy::PerAdd => {
                state.commit(descriptors, labels, n)?;
                state.persist(self.kind, &state.location)?;
            }
            FlushPolicy::Buffered => {
                state.buffer.push(descriptors, labels, n, NO_LABEL);
                if state.buffer.len() >= self.config.buffer_capacity {
                    state.drain_buffer()?;
                    state.persist(self.kind, &state.location)?;
                }
            }
            FlushPolicy::Manual => state.commit(descriptors, labels, n)?,
        }
        Ok(())
    }

    /// Training happens on the first committed batch; an explicit call has nothing left to do.
    pub fn train(&self) {
        debug!(engine = %self.kind, "train requested; backend trains on its first batch");
    }

    pub fn is_trained(&self) -> bool {
        self.state.read().backend.is_trained()
    }

    pub fn search(&self, queries: &[f32], k: usize) -> Result<SearchResult> {
        self.rows_in(queries)?;
        let state = self.flushed()?;
        Ok(state.backend.search(queries, k))
    }

    pub fn classify(&self, descriptors: &[f32]) -> Result<Vec<i64>> {
        self.rows_in(descriptors)?;
        let state = self.flushed()?;
        let neighbors = state.backend.search(descriptors, self.config.quorum);
        classify::vote(&neighbors, &state.ids)
    }

    pub fn get_descriptors(&self, positions: &[i64]) -> Result<Vec<f32>> {
        let state = self.flushed()?;
        let mut out = Vec::with_capacity(positions.len() * self.dimension);
        for &position in positions {
            let row = usize::try_from(position)
                .ok()
                .and_then(|p| state.backend.reconstruct(p))
                .ok_or(DescriptorError::ObjectNotFound {
                    position,
                    count: state.backend.ntotal(),
                })?;
            out.extend_from_slice(row);
        }
        Ok(out)
    }

    pub fn set_labels(&self, labels: BTreeMap<i64, String>) -> Result<()> {
        self.state.write().labels.replace(labels)
    }

    pub fn get_labels_all(&self) -> BTreeMap<i64, String> {
        self.state.read().labels.as_map().clone()
    }

    pub fn get_labels(&self, positions: &[i64]) -> Result<Vec<String>> {
        let state = self.flushed()?;
        positions
            .iter()
            .map(|&position| {
                let label_id = state.ids.label_at(position)?;
                if label_id == NO_LABEL {
                    return Ok(String::new());
                }
                Ok(state.labels.name(label_id).to_string())
            })
            .collect()
    }

    pub fn label_id_to_string(&self, label_ids: &[i64]) -> Vec<String> {
        let state = self.state.read();
        label_ids
            .iter()
            .map(|&id| state.labels.name(id).to_string())
            .collect()
    }

    /// Flush and write everything to the current location.
    pub fn store(&self) -> Result<()> {
        let mut state = self.state.write();
        state.drain_buffer()?;
        state.persist(self.kind, &state.location)
    }

    /// Flush and write everything to `path`, which becomes the location on success.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn store_to(&self, path: PathBuf) -> Result<()> {
        let mut state = self.state.write();
        state.drain_buffer()?;
        state.persist(self.kind, &path)?;
        info!(count = state.ids.len(), "stored descriptor set at new location");
        state.location = path;
        Ok(())
    }

    /// Number of row-major descriptors in `values`.
    fn rows_in(&self, values: &[f32]) -> Result<usize> {
        if values.len() % self.dimension != 0 {
            return Err(DescriptorError::DimensionMismatch {
                dimension: self.dimension,
                values: values.len(),
            });
        }
        Ok(values.len() / self.dimension)
    }

    /// Read access with the insert buffer drained.
    ///
    /// The common case of an empty buffer only takes the read lock. Otherwise
    /// the write lock is taken for the flush and then downgraded, so no other
    /// writer can slip in between the flush and the caller's read.
    fn flushed(&self) -> Result<RwLockReadGuard<'_, EngineState<B>>> {
        {
            let state = self.state.read();
            if state.buffer.is_empty() {
                return Ok(state);
            }
        }

        let mut state = self.state.write();
        if state.drain_buffer()? && self.config.flush_policy == FlushPolicy::Buffered {
            state.persist(self.kind, &state.location)?;
        }
        Ok(RwLockWriteGuard::downgrade(state))
    }
}

/// Report any failure while loading `path` as `OpenFailed`.
fn reading<T>(path: &Path, result: Result<T>) -> Result<T> {
    result.map_err(|e| match e {
        e @ DescriptorError::OpenFailed { .. } => e,
        other => DescriptorError::open_failed(path, other.to_string()),
    })
}
