//! Pending inserts awaiting a flush into the backing store.

/// Accumulates `(descriptor, label)` batches between flushes.
#[derive(Debug, Default)]
pub struct InsertBuffer {
    descriptors: Vec<f32>,
    labels: Vec<i64>,
    labelled: bool,
    len: usize,
}

/// Contents of a flushed buffer.
#[derive(Debug, PartialEq)]
pub struct PendingBatch {
    pub descriptors: Vec<f32>,
    /// `None` when no buffered batch carried labels.
    pub labels: Option<Vec<i64>>,
    pub len: usize,
}

impl InsertBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending descriptors.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffer `n` descriptors. Unlabelled batches record `fill` for each entry
    /// so labels stay aligned when labelled and unlabelled batches mix.
    pub fn push(&mut self, descriptors: &[f32], labels: Option<&[i64]>, n: usize, fill: i64) {
        self.descriptors.extend_from_slice(descriptors);
        match labels {
            Some(labels) => {
                self.labels.extend_from_slice(labels);
                self.labelled = true;
            }
            None => self.labels.resize(self.labels.len() + n, fill),
        }
        self.len += n;
    }

    /// Empty the buffer, handing back everything pending.
    pub fn take(&mut self) -> Option<PendingBatch> {
        if self.is_empty() {
            return None;
        }
        let batch = PendingBatch {
            descriptors: std::mem::take(&mut self.descriptors),
            labels: self.labelled.then(|| std::mem::take(&mut self.labels)),
            len: self.len,
        };
        self.labels.clear();
        self.labelled = false;
        self.len = 0;
        Some(batch)
    }
}
