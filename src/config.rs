//! Descriptor set configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};
use crate::persistence::serialization;

/// When added descriptors are committed and written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Commit and persist on every `add`.
    #[default]
    PerAdd,
    /// Accumulate in the insert buffer; commit and persist when it fills up
    /// or before the next read.
    Buffered,
    /// Commit in memory on `add`; only an explicit `store` writes to disk.
    Manual,
}

/// Configuration for a descriptor set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorSetConfig {
    /// Number of nearest neighbors consulted by `classify`.
    pub quorum: usize,
    /// Half-width of the per-dimension window used by the sparse engine.
    pub window: f32,
    pub flush_policy: FlushPolicy,
    /// Pending descriptors held before a forced flush (`Buffered` only).
    pub buffer_capacity: usize,
    /// Number of inverted lists for the IVF engine.
    pub nlist: usize,
    /// Number of inverted lists scanned per query.
    pub nprobe: usize,
    pub kmeans_iterations: usize,
    /// Seed for k-means centroid initialisation.
    pub seed: u64,
}

impl Default for DescriptorSetConfig {
    fn default() -> Self {
        Self {
            quorum: 7,
            window: 10.0,
            flush_policy: FlushPolicy::PerAdd,
            buffer_capacity: 200,
            nlist: 4,
            nprobe: 1,
            kmeans_iterations: 25,
            seed: 1234,
        }
    }
}

impl DescriptorSetConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let config: Self = serialization::from_json(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no engine can work with.
    pub fn validate(&self) -> Result<()> {
        if self.flush_policy == FlushPolicy::Buffered && self.buffer_capacity == 0 {
            return Err(DescriptorError::InvalidConfig(
                "buffer_capacity must be positive with the buffered flush policy".to_string(),
            ));
        }
        if self.nlist == 0 {
            return Err(DescriptorError::InvalidConfig(
                "nlist must be positive".to_string(),
            ));
        }
        if self.nprobe == 0 {
            return Err(DescriptorError::InvalidConfig(
                "nprobe must be positive".to_string(),
            ));
        }
        if self.window.is_nan() || self.window < 0.0 {
            return Err(DescriptorError::InvalidConfig(format!(
                "window must be a non-negative number, got {}",
                self.window
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DescriptorSetConfig::default();
        assert_eq!(config.quorum, 7);
        assert_eq!(config.flush_policy, FlushPolicy::PerAdd);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"quorum": 3, "flush_policy": "buffered"}"#).unwrap();

        let config = DescriptorSetConfig::from_json_file(&path).unwrap();
        assert_eq!(config.quorum, 3);
        assert_eq!(config.flush_policy, FlushPolicy::Buffered);
        assert_eq!(config.nlist, 4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = DescriptorSetConfig {
            window: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DescriptorError::InvalidConfig(_))
        ));

        let config = DescriptorSetConfig {
            flush_policy: FlushPolicy::Buffered,
            buffer_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
