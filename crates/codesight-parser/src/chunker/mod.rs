mod code;
mod config;
mod document;
mod patterns;

pub use code::chunk_code;
pub use config::ChunkConfig;
pub use document::chunk_document;
