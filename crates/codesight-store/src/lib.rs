//! DualStore: a usearch vector index plus a SQLite FTS5 text index, kept
//! consistent and addressed by `chunk_id`.

pub mod error;
pub mod fulltext;
pub mod manager;
pub mod vector;

pub use error::StoreError;
pub use fulltext::ChunkRow;
pub use manager::DualStore;
pub use vector::VectorHit;
