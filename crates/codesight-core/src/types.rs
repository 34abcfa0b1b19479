use serde::{Deserialize, Serialize};

/// Summary returned after an indexing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub repo_path: String,
    pub files_indexed: usize,
    pub chunks_created: usize,
    #[serde(default)]
    pub chunks_skipped_unchanged: usize,
    #[serde(default)]
    pub chunks_deleted: usize,
    pub total_chunks: usize,
    pub elapsed_seconds: f64,
}

/// Status info for an indexed folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoStatus {
    pub repo_path: String,
    pub indexed: bool,
    #[serde(default)]
    pub chunk_count: usize,
    #[serde(default)]
    pub files_indexed: usize,
    pub last_commit: Option<String>,
    pub last_indexed_at: Option<String>,
    #[serde(default)]
    pub stale: bool,
}

/// A single hydrated search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub snippet: String,
    pub score: f64,
    pub scope: String,
    pub chunk_id: String,
}

/// LLM-generated answer with the source chunks it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SearchResult>,
    pub model: String,
}
