//! Similarity-search backends the delegating engines hand their descriptors to.

pub mod flat;
pub mod ivf;
pub mod kmeans;
pub mod neighbor_queue;

pub use flat::FlatL2;
pub use ivf::IvfFlatL2;
