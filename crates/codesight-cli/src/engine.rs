use std::path::{Path, PathBuf};
use std::sync::Arc;

use codesight_core::{Answer, IndexStats, RepoStatus, SearchResult, ServerConfig};
use codesight_providers::{get_backend, get_embedder, EmbeddingProvider};
use codesight_retrieval::HybridRetriever;
use codesight_store::DualStore;

use crate::error::CliError;

const NO_RESULTS_MESSAGE: &str = "No relevant documents found. Try indexing first.";

/// Single entry point for indexing, searching, and asking questions of one
/// folder — the library surface `codesight-cli`'s `main` drives, and the
/// one other programs embed this workspace through.
pub struct Engine {
    folder_path: PathBuf,
    config: ServerConfig,
    store: DualStore,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Engine {
    /// Resolve `folder_path`, open its store, and load its embedder.
    pub fn open(folder_path: &Path, config: ServerConfig) -> Result<Self, CliError> {
        let canonical = std::fs::canonicalize(folder_path).map_err(|_| CliError::BadPath {
            path: folder_path.to_string_lossy().to_string(),
        })?;
        if !canonical.is_dir() {
            return Err(CliError::BadPath {
                path: canonical.to_string_lossy().to_string(),
            });
        }

        let embedder = get_embedder(&config.embedding_model, config.embedding_dim, &config.embedding_backend)?;
        let store = DualStore::open(&config.data_dir, &canonical, config.embedding_dim)?;

        Ok(Self {
            folder_path: canonical,
            config,
            store,
            embedder,
        })
    }

    pub fn folder_path(&self) -> &Path {
        &self.folder_path
    }

    /// Index (or re-index) every document in the folder.
    pub fn index(&mut self, force_rebuild: bool) -> Result<IndexStats, CliError> {
        let stats = codesight_indexer::index_repo(&self.folder_path, &self.config, force_rebuild)?;
        // The indexer opened its own `DualStore` handle; reopen ours so later
        // reads see what was just written.
        self.store = DualStore::open(&self.config.data_dir, &self.folder_path, self.config.embedding_dim)?;
        Ok(stats)
    }

    /// Hybrid BM25 + vector search, auto-indexing first if needed. `file_glob`,
    /// when present, restricts results to matching `file_path`s.
    pub fn search(&mut self, query: &str, top_k: usize, file_glob: Option<&str>) -> Result<Vec<SearchResult>, CliError> {
        self.ensure_indexed()?;
        let retriever = HybridRetriever::new(&self.store, self.embedder.as_ref());
        Ok(retriever.search(query, top_k, file_glob)?)
    }

    /// Search, then have the configured LLM backend synthesize an answer
    /// grounded in the retrieved chunks.
    pub fn ask(&mut self, question: &str, top_k: usize, file_glob: Option<&str>) -> Result<Answer, CliError> {
        let results = self.search(question, top_k, file_glob)?;
        if results.is_empty() {
            return Ok(Answer {
                text: NO_RESULTS_MESSAGE.to_string(),
                sources: Vec::new(),
                model: self.config.llm_model.clone(),
            });
        }

        let context = build_context(&results);
        let backend = get_backend(&self.config.llm_backend, Some(self.config.llm_model.clone()))?;
        let user_prompt = format!(
            "Based on the following documents, answer this question:\n\n\
             **Question:** {question}\n\n**Documents:**\n\n{context}"
        );
        let text = backend.generate(codesight_providers::SYSTEM_PROMPT, &user_prompt)?;

        Ok(Answer {
            text,
            sources: results,
            model: backend.model_id(),
        })
    }

    /// Current index status for this folder.
    pub fn status(&self) -> Result<RepoStatus, CliError> {
        let indexed = self.store.is_indexed()?;
        let last_indexed_at = self.store.last_indexed_at()?;
        let stale = indexed && is_stale(last_indexed_at.as_deref(), self.config.stale_threshold_seconds);

        Ok(RepoStatus {
            repo_path: self.folder_path.to_string_lossy().to_string(),
            indexed,
            chunk_count: self.store.chunk_count()?,
            files_indexed: self.store.file_count()?,
            last_commit: self.store.last_commit()?,
            last_indexed_at,
            stale,
        })
    }

    fn ensure_indexed(&mut self) -> Result<(), CliError> {
        if !self.store.is_indexed()? {
            tracing::info!(folder = %self.folder_path.display(), "no index found, building now");
            self.index(false)?;
            return Ok(());
        }

        let model_changed = self.store.embedding_model()?.as_deref() != Some(self.config.embedding_model.as_str());
        if model_changed {
            tracing::info!(folder = %self.folder_path.display(), "embedding model changed, forcing rebuild");
            self.index(true)?;
            return Ok(());
        }

        let last_indexed_at = self.store.last_indexed_at()?;
        if is_stale(last_indexed_at.as_deref(), self.config.stale_threshold_seconds) {
            tracing::info!(folder = %self.folder_path.display(), "index is stale, refreshing");
            self.index(false)?;
        }
        Ok(())
    }
}

fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[Source {}: {}, {}]\n{}", i + 1, r.file_path, r.scope, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

fn is_stale(last_indexed_at: Option<&str>, threshold_seconds: u64) -> bool {
    let Some(ts) = last_indexed_at else {
        return true;
    };
    let Ok(parsed) = time::OffsetDateTime::parse(ts, &time::format_description::well_known::Rfc3339) else {
        return true;
    };
    let age = (time::OffsetDateTime::now_utc() - parsed).whole_seconds().max(0) as u64;
    age > threshold_seconds
}
