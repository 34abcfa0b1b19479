mod chunk;
mod config;
mod glob;
mod language;
mod repo_meta;
mod types;

pub use chunk::{content_hash, make_chunk_id, make_context_header, Chunk};
pub use glob::glob_match;
pub use config::{
    resolve_embedding_dim, repo_data_dir, ServerConfig, BM25_CANDIDATE_MULTIPLIER,
    DEFAULT_EMBEDDING_BACKEND, DEFAULT_EMBEDDING_MODEL, DEFAULT_LLM_BACKEND, DEFAULT_LLM_MODEL,
    DEFAULT_TOP_K, EMBEDDING_MODEL_REGISTRY, STALE_THRESHOLD_SECONDS,
};
pub use language::{Language, CODE_EXTENSIONS, DOCUMENT_EXTENSIONS, TEXT_EXTENSIONS};
pub use repo_meta::{meta_keys, RepoMeta};
pub use types::{Answer, IndexStats, RepoStatus, SearchResult};

/// Truncate a string to at most `max_bytes` bytes on a valid UTF-8 boundary.
///
/// Used to cap snippet length for hydrated search results without ever
/// splitting a multi-byte character.
pub fn truncate_utf8_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
