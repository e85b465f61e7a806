//! On-disk layout of a descriptor set: backend files and the manifest.

pub mod manifest;
pub mod serialization;
pub mod vector_file;
