//! Walks a repository, routes each file to a text or document extractor,
//! and splits the result into scope-aware chunks.

pub mod chunker;
pub mod error;
pub mod extractors;
pub mod router;
pub mod walker;

pub use chunker::ChunkConfig;
pub use error::ParserError;
pub use extractors::Page;
pub use router::chunk_file;
pub use walker::walk_repo_files;
