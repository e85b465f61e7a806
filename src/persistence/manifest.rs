//! `manifest.json`: human-readable metadata written alongside the backend files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::EngineKind;
use crate::error::Result;
use crate::persistence::serialization;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Summary of a stored descriptor set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub engine: EngineKind,
    pub dimension: usize,
    pub vector_count: usize,
    /// CRC32 of the `ids.arr` written by the same store.
    pub ids_crc32: u32,
    pub version: String,
}

impl Manifest {
    pub fn new(engine: EngineKind, dimension: usize, vector_count: usize, ids_crc32: u32) -> Self {
        Self {
            engine,
            dimension,
            vector_count,
            ids_crc32,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(MANIFEST_FILE), serialization::to_json(self)?)?;
        Ok(())
    }

    /// Load the manifest from `dir`, or `None` if the set has none.
    pub fn read(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serialization::from_json(&bytes)?))
    }
}
