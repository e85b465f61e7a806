//! Flat binary descriptor file used by the linear-scan engines.
//!
//! Layout: `[dimension: u32][count: u32]` followed by `count * dimension`
//! little-endian f32 values in insertion order. Reads go through a memory map.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{DescriptorError, Result};

pub const VECTOR_FILE: &str = "descriptors.bin";

const HEADER_SIZE: usize = 8;

/// Write all rows to `path`, replacing any existing file.
pub fn write(path: &Path, dimension: usize, rows: &[f32]) -> Result<()> {
    let count = if dimension == 0 { 0 } else { rows.len() / dimension };
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    out.write_all(&encode_header(dimension, count))?;
    for value in rows {
        out.write_all(&value.to_le_bytes())?;
    }

    let file = out.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

/// Read a descriptor file, returning its dimension and rows.
pub fn read(path: &Path) -> Result<(usize, Vec<f32>)> {
    let file = File::open(path)?;
    // Fall back to a plain read when the file cannot be mapped.
    match unsafe { memmap2::Mmap::map(&file) } {
        Ok(mmap) => decode(path, &mmap),
        Err(_) => decode(path, &fs::read(path)?),
    }
}

fn decode(path: &Path, bytes: &[u8]) -> Result<(usize, Vec<f32>)> {
    if bytes.len() < HEADER_SIZE {
        return Err(DescriptorError::open_failed(path, "file too small for header"));
    }
    let (dimension, count) = decode_header(&bytes[..HEADER_SIZE]);

    let body = &bytes[HEADER_SIZE..];
    let expected = dimension
        .checked_mul(count)
        .and_then(|values| values.checked_mul(4))
        .ok_or_else(|| {
            DescriptorError::open_failed(
                path,
                format!("header of {} x {} descriptors is too large", count, dimension),
            )
        })?;
    if body.len() != expected {
        return Err(DescriptorError::open_failed(
            path,
            format!(
                "expected {} bytes of descriptor data, found {}",
                expected,
                body.len()
            ),
        ));
    }

    let rows = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Ok((dimension, rows))
}

fn encode_header(dimension: usize, count: usize) -> [u8; HEADER_SIZE] {
    let mut buf = [0u8; HEADER_SIZE];
    buf[0..4].copy_from_slice(&(dimension as u32).to_le_bytes());
    buf[4..8].copy_from_slice(&(count as u32).to_le_bytes());
    buf
}

fn decode_header(data: &[u8]) -> (usize, usize) {
    let dimension = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let count = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    (dimension, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(VECTOR_FILE);

        write(&path, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let (dimension, rows) = read(&path).unwrap();

        assert_eq!(dimension, 3);
        assert_eq!(rows, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_empty_file_keeps_dimension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(VECTOR_FILE);

        write(&path, 128, &[]).unwrap();
        let (dimension, rows) = read(&path).unwrap();
        assert_eq!(dimension, 128);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_header_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(VECTOR_FILE);
        write(&path, 2, &[1.5, 2.5]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], &2u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &1.5f32.to_le_bytes());
    }

    #[test]
    fn test_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(VECTOR_FILE);
        write(&path, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(
            read(&path),
            Err(DescriptorError::OpenFailed { .. })
        ));
    }

    #[test]
    fn test_oversized_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(VECTOR_FILE);
        write(&path, 2, &[1.0, 2.0]).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        bytes[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        fs::write(&path, &bytes).unwrap();
        assert!(matches!(
            read(&path),
            Err(DescriptorError::OpenFailed { .. })
        ));
    }
}
