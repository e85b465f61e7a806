//! Label id to display string mapping, persisted as `labels.txt`.
//!
//! One `"<label_id> <display_string>"` pair per line. On read the line is
//! split at the first run of whitespace and the trimmed remainder becomes the
//! display string, so names may hold inner spaces but no line breaks and no
//! leading or trailing whitespace.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{DescriptorError, Result};

pub const LABELS_FILE: &str = "labels.txt";

/// Mapping from caller-defined label ids to display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStore {
    labels: BTreeMap<i64, String>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every mapping. Last writer wins.
    ///
    /// Fails with `InvalidLabel`, leaving the current mapping in place, if a
    /// name would not survive a write and read of `labels.txt`.
    pub fn replace(&mut self, labels: BTreeMap<i64, String>) -> Result<()> {
        for (&id, name) in &labels {
            check_name(id, name)?;
        }
        self.labels = labels;
        Ok(())
    }

    /// Display string for a label id, or `""` when the id is unknown.
    pub fn name(&self, label_id: i64) -> &str {
        self.labels.get(&label_id).map(String::as_str).unwrap_or("")
    }

    pub fn as_map(&self) -> &BTreeMap<i64, String> {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let file = fs::File::create(dir.join(LABELS_FILE))?;
        let mut out = BufWriter::new(file);
        for (id, name) in &self.labels {
            writeln!(out, "{} {}", id, name)?;
        }
        out.flush()?;
        Ok(())
    }

    /// Read `labels.txt` from `dir`. A missing file yields an empty store.
    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(LABELS_FILE);
        if !path.exists() {
            return Ok(Self::new());
        }

        let text = fs::read_to_string(&path)?;
        let mut labels = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (id, name) = line
                .split_once(char::is_whitespace)
                .unwrap_or((line, ""));
            let id: i64 = id.parse().map_err(|_| {
                DescriptorError::open_failed(&path, format!("invalid label id: {}", id))
            })?;
            labels.insert(id, name.trim().to_string());
        }

        Ok(Self { labels })
    }
}

fn check_name(id: i64, name: &str) -> Result<()> {
    if name.contains(|c: char| c == '\n' || c == '\r') {
        return Err(DescriptorError::InvalidLabel {
            id,
            reason: "name contains a line break",
        });
    }
    if name.trim() != name {
        return Err(DescriptorError::InvalidLabel {
            id,
            reason: "name has leading or trailing whitespace",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn animals() -> BTreeMap<i64, String> {
        [(0, "no_class"), (1, "dog"), (2, "cat"), (-4, "hot dog")]
            .into_iter()
            .map(|(id, name)| (id, name.to_string()))
            .collect()
    }

    #[test]
    fn test_name_lookup() {
        let mut store = LabelStore::new();
        store.replace(animals()).unwrap();
        assert_eq!(store.name(1), "dog");
        assert_eq!(store.name(99), "");
    }

    #[test]
    fn test_replace_is_bulk() {
        let mut store = LabelStore::new();
        store.replace(animals()).unwrap();
        store
            .replace([(5, "panda".to_string())].into_iter().collect())
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.name(1), "");
    }

    #[test]
    fn test_replace_rejects_names_that_do_not_round_trip() {
        let mut store = LabelStore::new();
        store.replace(animals()).unwrap();

        for name in ["two\nlines", "carriage\rreturn", " padded", "trailing\t"] {
            let result = store.replace(BTreeMap::from([(7, name.to_string())]));
            assert!(
                matches!(result, Err(DescriptorError::InvalidLabel { id: 7, .. })),
                "{:?} accepted",
                name
            );
        }
        assert_eq!(store.as_map(), &animals());
    }

    #[test]
    fn test_write_and_read() {
        let dir = TempDir::new().unwrap();
        let mut store = LabelStore::new();
        store.replace(animals()).unwrap();
        store.write(dir.path()).unwrap();

        let loaded = LabelStore::read(dir.path()).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.name(-4), "hot dog");
    }

    #[test]
    fn test_read_is_order_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LABELS_FILE), "2 cat\n\n1   dog\n").unwrap();

        let loaded = LabelStore::read(dir.path()).unwrap();
        assert_eq!(loaded.name(1), "dog");
        assert_eq!(loaded.name(2), "cat");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(LabelStore::read(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_read_rejects_bad_id() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LABELS_FILE), "one dog\n").unwrap();
        assert!(matches!(
            LabelStore::read(dir.path()),
            Err(DescriptorError::OpenFailed { .. })
        ));
    }
}
