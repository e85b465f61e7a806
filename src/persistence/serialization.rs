//! Serialization utilities: bincode for backend files, JSON for manifests and config.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Result};

/// Encode data to bincode bytes.
pub fn to_bincode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| DescriptorError::SerializationError(e.to_string()))
}

/// Decode data from bincode bytes.
pub fn from_bincode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| DescriptorError::SerializationError(e.to_string()))
}

/// Encode data to pretty-printed JSON bytes.
pub fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
        .map_err(|e| DescriptorError::SerializationError(e.to_string()))
}

/// Decode data from JSON bytes.
pub fn from_json<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| DescriptorError::SerializationError(e.to_string()))
}

/// Write `value` to `path` as bincode, replacing any existing file.
pub fn write_bincode_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = to_bincode(value)?;
    fs::write(path, data)?;
    Ok(())
}

/// Read a bincode file written by [`write_bincode_file`].
pub fn read_bincode_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = fs::read(path)?;
    from_bincode(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        dimension: usize,
        rows: Vec<f32>,
    }

    #[test]
    fn test_bincode_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.bin");
        let sample = Sample {
            dimension: 2,
            rows: vec![1.0, 2.0, 3.0, 4.0],
        };

        write_bincode_file(&path, &sample).unwrap();
        let loaded: Sample = read_bincode_file(&path).unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_corrupt_bincode() {
        let result: Result<Sample> = from_bincode(&[1, 2, 3]);
        assert!(matches!(result, Err(DescriptorError::SerializationError(_))));
    }

    #[test]
    fn test_json_decode_error() {
        let result: Result<Sample> = from_json(b"{not json");
        assert!(matches!(result, Err(DescriptorError::SerializationError(_))));
    }
}
