//! # descset
//!
//! Storage-agnostic descriptor sets: fixed-dimension `f32` vectors with
//! integer label ids, persisted to a directory.
//!
//! This library provides:
//! - Exact and partitioned (IVF) k-NN backends, plus in-core dense and
//!   windowed (sparse) linear scans
//! - Quorum-vote classification over k-NN results
//! - Label id -> name maps stored alongside the descriptors
//! - Buffered inserts with a configurable flush policy
//!
//! ## Example
//!
//! ```rust
//! use descset::{DescriptorSet, DescriptorSetConfig, EngineKind};
//!
//! let dir = tempfile::TempDir::new().unwrap();
//! let set = DescriptorSet::create(
//!     dir.path().join("pets"),
//!     2,
//!     EngineKind::ExactFlat,
//!     DescriptorSetConfig::default(),
//! )
//! .unwrap();
//!
//! set.add(&[0.0, 0.0, 0.5, 0.5, 9.0, 9.0], Some(&[1, 1, 2])).unwrap();
//! set.set_labels_from(&[1, 2], &["dog", "cat"]).unwrap();
//!
//! let results = set.search(&[0.1, 0.1], 2).unwrap();
//! assert_eq!(results.ids(), &[0, 1]);
//!
//! let labels = set.classify(&[8.0, 8.0]).unwrap();
//! assert_eq!(set.label_id_to_string(&labels), vec!["dog"]);
//! ```

pub mod backend;
pub mod buffer;
pub mod classify;
pub mod config;
pub mod descriptor_set;
pub mod distance;
pub mod engine;
pub mod error;
pub mod id_table;
pub mod index;
pub mod labels;
pub mod linear;
pub mod persistence;
pub mod search;

pub use config::{DescriptorSetConfig, FlushPolicy};
pub use descriptor_set::DescriptorSet;
pub use engine::EngineKind;
pub use error::{DescriptorError, Result};
pub use search::{SearchResult, MISSING_DISTANCE, MISSING_ID};
