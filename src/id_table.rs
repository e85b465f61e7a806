//! Position to label id table, persisted as `ids.arr`.
//!
//! File layout (little-endian): `[count: u32][count x label_id: i64]`.

use std::fs;
use std::path::Path;

use crate::error::{DescriptorError, Result};

pub const IDS_FILE: &str = "ids.arr";

/// Label id recorded for descriptors added without a label. Never votes and
/// never has a name.
pub const NO_LABEL: i64 = i64::MIN;

/// Append-only table mapping each stored position to its label id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdTable {
    labels: Vec<i64>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry per new position. `None` records [`NO_LABEL`] for `n` positions.
    pub fn extend(&mut self, labels: Option<&[i64]>, n: usize) {
        match labels {
            Some(labels) => self.labels.extend_from_slice(labels),
            None => self.labels.resize(self.labels.len() + n, NO_LABEL),
        }
    }

    /// Label id at `position`, or `ObjectNotFound` when out of range.
    pub fn label_at(&self, position: i64) -> Result<i64> {
        usize::try_from(position)
            .ok()
            .and_then(|p| self.labels.get(p).copied())
            .ok_or(DescriptorError::ObjectNotFound {
                position,
                count: self.labels.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.labels.len() * 8);
        buf.extend_from_slice(&(self.labels.len() as u32).to_le_bytes());
        for id in &self.labels {
            buf.extend_from_slice(&id.to_le_bytes());
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header: [u8; 4] = bytes
            .get(0..4)
            .and_then(|h| h.try_into().ok())
            .ok_or_else(|| {
                DescriptorError::SerializationError("id table too small for header".to_string())
            })?;
        let count = u32::from_le_bytes(header) as usize;

        let body = &bytes[4..];
        if body.len() != count * 8 {
            return Err(DescriptorError::SerializationError(format!(
                "id table declares {} entries but holds {} bytes",
                count,
                body.len()
            )));
        }

        let labels = body
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                i64::from_le_bytes(raw)
            })
            .collect();
        Ok(Self { labels })
    }

    /// Write `ids.arr` into `dir`, returning the CRC32 of the bytes written.
    pub fn write(&self, dir: &Path) -> Result<u32> {
        let bytes = self.to_bytes();
        fs::write(dir.join(IDS_FILE), &bytes)?;
        Ok(crc32fast::hash(&bytes))
    }

    /// Read `ids.arr` from `dir` together with the CRC32 of its bytes.
    pub fn read(dir: &Path) -> Result<(Self, u32)> {
        let bytes = fs::read(dir.join(IDS_FILE))?;
        let table = Self::from_bytes(&bytes)?;
        Ok((table, crc32fast::hash(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extend_with_and_without_labels() {
        let mut table = IdTable::new();
        table.extend(Some(&[4, 5]), 2);
        table.extend(None, 3);

        assert_eq!(table.len(), 5);
        assert_eq!(table.label_at(1).unwrap(), 5);
        assert_eq!(table.label_at(4).unwrap(), NO_LABEL);
    }

    #[test]
    fn test_label_at_out_of_range() {
        let mut table = IdTable::new();
        table.extend(Some(&[1]), 1);

        assert!(matches!(
            table.label_at(1),
            Err(DescriptorError::ObjectNotFound { position: 1, count: 1 })
        ));
        assert!(table.label_at(-3).is_err());
    }

    #[test]
    fn test_byte_layout() {
        let mut table = IdTable::new();
        table.extend(Some(&[7, -2]), 2);
        let bytes = table.to_bytes();

        assert_eq!(bytes.len(), 4 + 16);
        assert_eq!(&bytes[0..4], &2u32.to_le_bytes());
        assert_eq!(&bytes[12..20], &(-2i64).to_le_bytes());
    }

    #[test]
    fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let mut table = IdTable::new();
        table.extend(Some(&[1, 1, 2, 3]), 4);
        let written = table.write(dir.path()).unwrap();

        let (loaded, checksum) = IdTable::read(dir.path()).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(checksum, written);
    }

    #[test]
    fn test_from_bytes_truncated() {
        assert!(IdTable::from_bytes(&[1, 0]).is_err());
        assert!(IdTable::from_bytes(&[2, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]).is_err());
    }
}
