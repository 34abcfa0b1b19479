//! Incremental indexing pipeline: walk, chunk, diff against what's stored,
//! embed only what changed, and persist.

pub mod error;
pub mod git;
pub mod pipeline;

pub use error::IndexerError;
pub use pipeline::index_repo;
