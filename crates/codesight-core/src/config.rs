use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Tested embedding models and their vector dimension. Any other model name
/// falls back to 384 (`DEFAULT_EMBEDDING_DIM`'s dimension).
pub const EMBEDDING_MODEL_REGISTRY: &[(&str, usize)] = &[
    ("sentence-transformers/all-MiniLM-L6-v2", 384),
    ("nomic-ai/nomic-embed-text-v1.5", 768),
    ("mixedbread-ai/mxbai-embed-large-v1", 1024),
    ("jinaai/jina-embeddings-v2-base-code", 768),
    ("text-embedding-3-large", 3072),
    ("text-embedding-3-small", 1536),
];

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_BACKEND: &str = "local";
pub const DEFAULT_LLM_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_LLM_BACKEND: &str = "claude";
pub const DEFAULT_TOP_K: usize = 8;
pub const STALE_THRESHOLD_SECONDS: u64 = 300;
pub const BM25_CANDIDATE_MULTIPLIER: usize = 3;

/// Vector dimension for a known embedding model, or 384 if unrecognized.
pub fn resolve_embedding_dim(model_name: &str) -> usize {
    EMBEDDING_MODEL_REGISTRY
        .iter()
        .find(|(name, _)| *name == model_name)
        .map(|(_, dim)| *dim)
        .unwrap_or(384)
}

/// Runtime configuration, built from environment variables with the
/// original source's defaults where unset.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub embedding_model: String,
    pub embedding_backend: String,
    pub embedding_dim: usize,
    pub top_k: usize,
    pub chunk_max_lines: u32,
    pub chunk_overlap_lines: u32,
    pub doc_chunk_max_chars: usize,
    pub doc_chunk_overlap_chars: usize,
    pub stale_threshold_seconds: u64,
    pub llm_backend: String,
    pub llm_model: String,
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let embedding_model = env_or(
            "CODESIGHT_EMBEDDING_MODEL",
            DEFAULT_EMBEDDING_MODEL,
        );
        let embedding_dim = resolve_embedding_dim(&embedding_model);
        Self {
            embedding_model,
            embedding_backend: env_or("CODESIGHT_EMBEDDING_BACKEND", DEFAULT_EMBEDDING_BACKEND),
            embedding_dim,
            top_k: DEFAULT_TOP_K,
            chunk_max_lines: 200,
            chunk_overlap_lines: 50,
            doc_chunk_max_chars: 1500,
            doc_chunk_overlap_chars: 200,
            stale_threshold_seconds: STALE_THRESHOLD_SECONDS,
            llm_backend: env_or("CODESIGHT_LLM_BACKEND", DEFAULT_LLM_BACKEND),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            data_dir: default_data_dir(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CODESIGHT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs_home().join(".codesight").join("data")
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."))
}

/// Per-folder storage subdirectory: `<data_dir>/<12-hex-SHA256(realpath)>/`.
///
/// `repo_path` should already be canonicalized by the caller (e.g. via
/// `std::fs::canonicalize`) so the same folder always hashes to the same
/// namespace regardless of the working directory it was referenced from.
pub fn repo_data_dir(data_dir: &Path, canonical_repo_path: &Path) -> PathBuf {
    let digest = Sha256::digest(canonical_repo_path.to_string_lossy().as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    data_dir.join(&hex[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_model_dim() {
        assert_eq!(resolve_embedding_dim("sentence-transformers/all-MiniLM-L6-v2"), 384);
        assert_eq!(resolve_embedding_dim("mixedbread-ai/mxbai-embed-large-v1"), 1024);
    }

    #[test]
    fn resolve_unknown_model_falls_back() {
        assert_eq!(resolve_embedding_dim("some-unlisted-model"), 384);
    }

    #[test]
    fn repo_data_dir_is_deterministic_12_hex() {
        let base = Path::new("/tmp/data");
        let a = repo_data_dir(base, Path::new("/home/me/project"));
        let b = repo_data_dir(base, Path::new("/home/me/project"));
        assert_eq!(a, b);
        let suffix = a.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(suffix.len(), 12);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_paths_hash_differently() {
        let base = Path::new("/tmp/data");
        let a = repo_data_dir(base, Path::new("/home/me/project-a"));
        let b = repo_data_dir(base, Path::new("/home/me/project-b"));
        assert_ne!(a, b);
    }
}
